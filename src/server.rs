use crate::archive::extract_zip;
use crate::config::AppConfig;
use crate::reconstruct::reconstruct;
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, HttpServer, get, post, web};
use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use serde::Deserialize;

/// Request header carried in front of the zip stream (and as form fields on
/// the multipart endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct ReconstructRequest {
    pub estimator: String,
    #[serde(default)]
    pub preprocessing: Vec<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "nerf".to_string()
}

/// Split a framed request body at the `boundary` byte offset into its JSON
/// header and the raw zip payload.
pub fn parse_framed_body(body: &[u8], boundary: usize) -> Result<(ReconstructRequest, &[u8])> {
    if boundary > body.len() {
        anyhow::bail!(
            "boundary {} exceeds body length {}",
            boundary,
            body.len()
        );
    }
    let (header, payload) = body.split_at(boundary);
    let request = serde_json::from_slice(header).context("Malformed request header JSON")?;
    Ok((request, payload))
}

/// The blocking reconstruction flow shared by both upload endpoints: stage
/// the zip in a fresh scratch dir, extract, reconstruct, read the snapshot
/// back. The scratch dir is removed when the `TempDir` drops, success or not.
fn run_upload(config: &AppConfig, request: &ReconstructRequest, zip_bytes: &[u8]) -> Result<Vec<u8>> {
    let scratch = tempfile::Builder::new()
        .prefix("nerfup-")
        .tempdir_in(&config.scratch_root)
        .context("Failed to create scratch directory")?;

    let zip_path = scratch.path().join("temp.zip");
    std::fs::write(&zip_path, zip_bytes)?;
    let extracted = extract_zip(&zip_path, scratch.path())?;
    log::info!(
        "Extracted {} files to {}",
        extracted,
        scratch.path().display()
    );

    let snapshot = reconstruct(
        scratch.path(),
        &request.preprocessing,
        &request.model,
        &request.estimator,
        config,
    )?;

    // Read the artifact before the scratch dir is torn down.
    std::fs::read(&snapshot).with_context(|| format!("Missing artifact {}", snapshot.display()))
}

fn snapshot_response(bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"nerfsnapshot.ingp\"",
        ))
        .body(bytes)
}

#[get("/health")]
pub async fn health(_req: HttpRequest, _: web::Data<AppConfig>) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

#[get("/")]
pub async fn home() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("static/index.html"))
}

/// Custom framed upload: a `boundary` request header gives the byte length
/// of a JSON prefix (estimator, preprocessing, model); the rest of the body
/// is a raw zip stream. Responds with the snapshot as a file download, or a
/// bare error status with no detail.
#[post("/start_nerf")]
pub async fn start_nerf(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let Some(boundary) = req
        .headers()
        .get("boundary")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    else {
        return HttpResponse::BadRequest().finish();
    };

    let (request, payload) = match parse_framed_body(&body, boundary) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::error!("Rejecting framed upload: {:#}", e);
            return HttpResponse::BadRequest().finish();
        }
    };

    let payload = payload.to_vec();
    let result = web::block(move || {
        let config = config.get_ref();
        run_upload(config, &request, &payload)
    })
    .await;

    match result {
        Ok(Ok(bytes)) => snapshot_response(bytes),
        Ok(Err(e)) => {
            log::error!("Reconstruction failed: {:#}", e);
            HttpResponse::InternalServerError().finish()
        }
        Err(e) => {
            log::error!("Reconstruction worker failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Standard multipart form upload with the same fields (`estimator`,
/// repeated `preprocessing`, `images` zip file); redirects home when done.
#[post("/start_nerf_debug")]
pub async fn start_nerf_debug(mut payload: Multipart, config: web::Data<AppConfig>) -> HttpResponse {
    let mut estimator = String::new();
    let mut preprocessing = Vec::new();
    let mut zip_bytes = Vec::new();

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::error!("Rejecting multipart upload: {}", e);
                return HttpResponse::BadRequest().finish();
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let mut contents = Vec::new();
        loop {
            match field.try_next().await {
                Ok(Some(chunk)) => contents.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    log::error!("Rejecting multipart upload: {}", e);
                    return HttpResponse::BadRequest().finish();
                }
            }
        }

        match name.as_str() {
            "estimator" => estimator = String::from_utf8_lossy(&contents).into_owned(),
            "preprocessing" => preprocessing.push(String::from_utf8_lossy(&contents).into_owned()),
            "images" => zip_bytes = contents,
            other => log::warn!("Ignoring unknown form field '{}'", other),
        }
    }

    let request = ReconstructRequest {
        estimator,
        preprocessing,
        model: default_model(),
    };

    let result = web::block(move || {
        let config = config.get_ref();
        run_upload(config, &request, &zip_bytes)
    })
    .await;

    match result {
        Ok(Ok(_)) => HttpResponse::Found()
            .insert_header(("Location", "/"))
            .finish(),
        Ok(Err(e)) => {
            log::error!("Reconstruction failed: {:#}", e);
            HttpResponse::InternalServerError().finish()
        }
        Err(e) => {
            log::error!("Reconstruction worker failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub async fn startup(config: AppConfig) -> std::io::Result<()> {
    let bind_addr = (config.host.clone(), config.port);
    let max_upload = config.max_upload_bytes;
    let app_config = web::Data::new(config);

    log::info!("Starting server at {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_config.clone())
            .app_data(web::PayloadConfig::new(max_upload))
            .service(health)
            .service(home)
            .service(start_nerf)
            .service(start_nerf_debug)
    })
    .bind(bind_addr)?
    .run()
    .await
}
