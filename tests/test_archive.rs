use anyhow::Result;
use nerfup::archive::extract_zip;
use std::io::Write;
use zip::write::SimpleFileOptions;

fn write_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(contents)?;
    }
    writer.finish()?;
    Ok(())
}

#[test]
fn extracts_nested_entries() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let zip_path = dir.path().join("upload.zip");
    write_zip(
        &zip_path,
        &[
            ("images/one.jpg", b"fake jpeg one"),
            ("images/two.jpg", b"fake jpeg two"),
            ("notes.txt", b"hello"),
        ],
    )?;

    let dest = dir.path().join("out");
    std::fs::create_dir_all(&dest)?;
    let extracted = extract_zip(&zip_path, &dest)?;

    assert_eq!(extracted, 3);
    assert_eq!(std::fs::read(dest.join("images/one.jpg"))?, b"fake jpeg one");
    assert_eq!(std::fs::read(dest.join("notes.txt"))?, b"hello");
    Ok(())
}

#[test]
fn rejects_non_zip_payloads() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let bogus = dir.path().join("upload.zip");
    std::fs::write(&bogus, b"this is not a zip archive")?;

    assert!(extract_zip(&bogus, dir.path()).is_err());
    Ok(())
}

#[test]
fn rejects_zip_slip_entries() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let zip_path = dir.path().join("evil.zip");
    write_zip(&zip_path, &[("../escape.txt", b"gotcha")])?;

    let dest = dir.path().join("out");
    std::fs::create_dir_all(&dest)?;
    assert!(extract_zip(&zip_path, &dest).is_err());
    assert!(!dir.path().join("escape.txt").exists());
    Ok(())
}
