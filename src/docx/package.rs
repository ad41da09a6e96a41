// 📦 Package - the ZIP container of a .docx
//
// Parts are kept as raw bytes in archive order; only the parts a caller
// replaces are rewritten.

use anyhow::{Context, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Clone)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<PackagePart>,
}

impl Package {
    pub fn new() -> Self {
        Package::default()
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("Not a valid .docx: {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).context("Failed to open ZIP archive")?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i).context("Failed to read ZIP entry")?;
            if file.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .with_context(|| format!("Failed to read part: {}", file.name()))?;

            parts.push(PackagePart {
                name: file.name().to_string(),
                data,
            });
        }

        Ok(Package { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Replace a part in place, or append it
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)
                .with_context(|| format!("Failed to add part: {}", part.name))?;
            zip.write_all(&part.data)?;
        }

        let cursor = zip.finish().context("Failed to finish ZIP archive")?;
        Ok(cursor.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write document: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_survive_round_trip_in_order() {
        let mut package = Package::new();
        package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        package.set_part("word/document.xml", b"<w:document/>".to_vec());
        package.set_part("word/media/image1.png", vec![0, 1, 2, 255]);

        let reopened = Package::from_bytes(&package.to_bytes().unwrap()).unwrap();
        let names: Vec<&str> = reopened.part_names().collect();
        assert_eq!(names, vec!["[Content_Types].xml", "word/document.xml", "word/media/image1.png"]);
        assert_eq!(reopened.part("word/media/image1.png"), Some(&[0u8, 1, 2, 255][..]));
    }

    #[test]
    fn test_set_part_replaces_existing() {
        let mut package = Package::new();
        package.set_part("a.xml", b"1".to_vec());
        package.set_part("a.xml", b"2".to_vec());
        assert_eq!(package.part_names().count(), 1);
        assert_eq!(package.part("a.xml"), Some(&b"2"[..]));
        assert!(!package.has_part("b.xml"));
    }

    #[test]
    fn test_garbage_is_not_a_package() {
        assert!(Package::from_bytes(b"not a zip").is_err());
    }
}
