use anyhow::{Context, Result, bail};
use serde_json::json;
use std::path::Path;

/// Intrinsics of a COLMAP camera, already unpacked from the model-specific
/// parameter layout of `cameras.txt`.
#[derive(Debug, Clone)]
pub struct CameraIntrinsics {
    pub width: f64,
    pub height: f64,
    pub fl_x: f64,
    pub fl_y: f64,
    pub cx: f64,
    pub cy: f64,
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
}

impl CameraIntrinsics {
    /// Parse a non-comment line of `cameras.txt`:
    /// `CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]`
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            bail!("Malformed camera line: '{}'", line);
        }
        let model = fields[1];
        let width: f64 = fields[2].parse()?;
        let height: f64 = fields[3].parse()?;
        let params: Vec<f64> = fields[4..]
            .iter()
            .map(|p| p.parse::<f64>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("Bad camera params in '{}'", line))?;

        let p = |i: usize| params.get(i).copied().unwrap_or(0.0);

        // Parameter layout depends on the camera model.
        let (fl_x, fl_y, cx, cy, k1, k2, p1, p2) = match model {
            "SIMPLE_PINHOLE" => (p(0), p(0), p(1), p(2), 0.0, 0.0, 0.0, 0.0),
            "PINHOLE" => (p(0), p(1), p(2), p(3), 0.0, 0.0, 0.0, 0.0),
            "SIMPLE_RADIAL" | "SIMPLE_RADIAL_FISHEYE" => {
                (p(0), p(0), p(1), p(2), p(3), 0.0, 0.0, 0.0)
            }
            "RADIAL" | "RADIAL_FISHEYE" => (p(0), p(0), p(1), p(2), p(3), p(4), 0.0, 0.0),
            "OPENCV" => (p(0), p(1), p(2), p(3), p(4), p(5), p(6), p(7)),
            "OPENCV_FISHEYE" => (p(0), p(1), p(2), p(3), p(4), p(5), 0.0, 0.0),
            other => bail!("Unsupported COLMAP camera model: {}", other),
        };

        Ok(Self {
            width,
            height,
            fl_x,
            fl_y,
            cx,
            cy,
            k1,
            k2,
            p1,
            p2,
        })
    }

    pub fn camera_angle_x(&self) -> f64 {
        2.0 * (self.width / (2.0 * self.fl_x)).atan()
    }

    pub fn camera_angle_y(&self) -> f64 {
        2.0 * (self.height / (2.0 * self.fl_y)).atan()
    }
}

/// Unit-quaternion (w, x, y, z) to rotation matrix.
fn qvec_to_rotmat(q: [f64; 4]) -> [[f64; 3]; 3] {
    let [w, x, y, z] = q;
    [
        [
            1.0 - 2.0 * y * y - 2.0 * z * z,
            2.0 * x * y - 2.0 * w * z,
            2.0 * x * z + 2.0 * w * y,
        ],
        [
            2.0 * x * y + 2.0 * w * z,
            1.0 - 2.0 * x * x - 2.0 * z * z,
            2.0 * y * z - 2.0 * w * x,
        ],
        [
            2.0 * x * z - 2.0 * w * y,
            2.0 * y * z + 2.0 * w * x,
            1.0 - 2.0 * x * x - 2.0 * y * y,
        ],
    ]
}

/// Camera-to-world matrix from a world-to-camera rotation + translation
/// (the rigid inverse), optionally post-multiplied by the COLMAP→NGP
/// axis flip diag(1, -1, -1, 1).
fn camera_to_world(q: [f64; 4], t: [f64; 3], flip: bool) -> [[f64; 4]; 4] {
    let r = qvec_to_rotmat(q);
    let mut c2w = [[0.0; 4]; 4];
    for i in 0..3 {
        for j in 0..3 {
            c2w[i][j] = r[j][i];
        }
        c2w[i][3] = -(r[0][i] * t[0] + r[1][i] * t[1] + r[2][i] * t[2]);
    }
    c2w[3][3] = 1.0;

    if flip {
        for row in c2w.iter_mut() {
            row[1] = -row[1];
            row[2] = -row[2];
        }
    }
    c2w
}

/// Sharpness score of a training image: variance of its Laplacian.
/// Unreadable images score 0 so a bad frame never aborts the conversion.
fn image_sharpness(path: &Path) -> f64 {
    let Ok(img) = image::open(path) else {
        return 0.0;
    };
    let gray = img.to_luma8();
    let lap = imageproc::filter::laplacian_filter(&gray);

    let n = lap.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean: f64 = lap.iter().map(|v| *v as f64).sum::<f64>() / n;
    lap.iter().map(|v| (*v as f64 - mean).powi(2)).sum::<f64>() / n
}

fn first_data_line(contents: &str) -> Option<&str> {
    contents
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
}

/// Convert a COLMAP text model (`cameras.txt` + `images.txt` in `text_dir`)
/// into an Instant-NGP `transforms.json` at `output_path`.
///
/// Image paths in the output are relative to the scene root (`path`), which
/// must contain `images_folder`. The first `skip_early` frames (by image
/// name) are dropped. `keep_colmap_coords` keeps COLMAP's frame of
/// reference, applying only the per-camera axis flip and no recentering.
pub fn colmap_to_transforms(
    path: &Path,
    images_folder: &str,
    text_dir: &Path,
    output_path: &Path,
    aabb_scale: u32,
    skip_early: usize,
    keep_colmap_coords: bool,
) -> Result<()> {
    let cameras_txt = std::fs::read_to_string(text_dir.join("cameras.txt"))
        .with_context(|| format!("Failed to read {}/cameras.txt", text_dir.display()))?;
    let camera_line = first_data_line(&cameras_txt)
        .context("cameras.txt contains no camera definitions")?;
    let camera = CameraIntrinsics::parse(camera_line)?;

    let images_txt = std::fs::read_to_string(text_dir.join("images.txt"))
        .with_context(|| format!("Failed to read {}/images.txt", text_dir.display()))?;

    // images.txt alternates pose lines and 2D-point lines. The point line
    // is empty for images without observations, so empty lines still count
    // in the alternation; only comment lines are skipped outright.
    let mut poses: Vec<(String, [f64; 4], [f64; 3])> = Vec::new();
    for (i, line) in images_txt
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#'))
        .enumerate()
    {
        if i % 2 != 0 || line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            bail!("Malformed image line in images.txt: '{}'", line);
        }
        let q: [f64; 4] = [
            fields[1].parse()?,
            fields[2].parse()?,
            fields[3].parse()?,
            fields[4].parse()?,
        ];
        let t: [f64; 3] = [fields[5].parse()?, fields[6].parse()?, fields[7].parse()?];
        poses.push((fields[9].to_string(), q, t));
    }

    if poses.is_empty() {
        bail!("COLMAP reconstructed no camera poses in {}", text_dir.display());
    }
    poses.sort_by(|a, b| a.0.cmp(&b.0));

    let mut frames = Vec::new();
    for (name, q, t) in poses.into_iter().skip(skip_early) {
        let image_path = path.join(images_folder).join(&name);
        frames.push(json!({
            "file_path": format!("{}/{}", images_folder, name),
            "sharpness": image_sharpness(&image_path),
            "transform_matrix": camera_to_world(q, t, keep_colmap_coords),
        }));
    }

    let out = json!({
        "camera_angle_x": camera.camera_angle_x(),
        "camera_angle_y": camera.camera_angle_y(),
        "fl_x": camera.fl_x,
        "fl_y": camera.fl_y,
        "k1": camera.k1,
        "k2": camera.k2,
        "p1": camera.p1,
        "p2": camera.p2,
        "cx": camera.cx,
        "cy": camera.cy,
        "w": camera.width,
        "h": camera.height,
        "aabb_scale": aabb_scale,
        "frames": frames,
    });

    let file = std::fs::File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    serde_json::to_writer_pretty(file, &out)?;
    log::info!(
        "Wrote {} frames to {}",
        out["frames"].as_array().map(Vec::len).unwrap_or(0),
        output_path.display()
    );
    Ok(())
}
