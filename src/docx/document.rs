// 📝 Document - main part, relationships and content types of a .docx
//
// Body edits go through node indices of the w:body children. The trailing
// w:sectPr (page setup) always stays last.

use super::content::paragraph_text;
use super::package::Package;
use super::xml::{self, XmlElement, XmlNode};
use anyhow::{Context, Result};
use std::path::Path;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

pub const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub struct Document {
    package: Package,

    /// w:document with the body taken out
    root: XmlElement,
    body_index: usize,
    body: XmlElement,

    rels: XmlElement,
    content_types: Option<XmlElement>,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package(package).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let main = package
            .part(DOCUMENT_PART)
            .context("Package has no word/document.xml")?;
        let mut root = xml::parse(main).context("Failed to parse word/document.xml")?;

        let body_index = root.child_index("w:body").context("Document has no w:body")?;
        let body = match root.children.remove(body_index) {
            XmlNode::Element(body) => body,
            XmlNode::Text(_) => anyhow::bail!("Document body is not an element"),
        };

        let rels = match package.part(DOCUMENT_RELS_PART) {
            Some(data) => xml::parse(data).context("Failed to parse document relationships")?,
            None => XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS),
        };

        let content_types = match package.part(CONTENT_TYPES_PART) {
            Some(data) => Some(xml::parse(data).context("Failed to parse [Content_Types].xml")?),
            None => None,
        };

        Ok(Document {
            package,
            root,
            body_index,
            body,
            rels,
            content_types,
        })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut package = self.package.clone();

        let mut root = self.root.clone();
        let index = self.body_index.min(root.children.len());
        root.children.insert(index, XmlNode::Element(self.body.clone()));

        package.set_part(DOCUMENT_PART, xml::serialize(&root)?);
        package.set_part(DOCUMENT_RELS_PART, xml::serialize(&self.rels)?);
        if let Some(content_types) = &self.content_types {
            package.set_part(CONTENT_TYPES_PART, xml::serialize(content_types)?);
        }

        package.to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write document: {}", path.display()))
    }

    // ========================================================================
    // BODY
    // ========================================================================

    pub fn body(&self) -> &XmlElement {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut XmlElement {
        &mut self.body
    }

    /// Body-level element at a node index
    pub fn element_at(&self, index: usize) -> Option<&XmlElement> {
        match self.body.children.get(index)? {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        }
    }

    pub fn element_at_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        match self.body.children.get_mut(index)? {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        }
    }

    /// Node indices of body-level paragraphs, in order
    pub fn paragraph_indices(&self) -> Vec<usize> {
        self.indices_of("w:p")
    }

    /// Node indices of body-level tables, in order
    pub fn table_indices(&self) -> Vec<usize> {
        self.indices_of("w:tbl")
    }

    fn indices_of(&self, name: &str) -> Vec<usize> {
        self.body
            .children
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, XmlNode::Element(e) if e.is(name)))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn paragraphs(&self) -> Vec<&XmlElement> {
        self.body.children_named("w:p").collect()
    }

    pub fn tables(&self) -> Vec<&XmlElement> {
        self.body.children_named("w:tbl").collect()
    }

    /// Node index of the first body paragraph whose text contains `needle`
    pub fn find_paragraph(&self, needle: &str) -> Option<usize> {
        self.paragraph_indices().into_iter().find(|&i| {
            self.element_at(i)
                .map(|p| paragraph_text(p).contains(needle))
                .unwrap_or(false)
        })
    }

    pub fn insert_at(&mut self, index: usize, element: XmlElement) {
        let index = index.min(self.append_index());
        self.body.children.insert(index, XmlNode::Element(element));
    }

    pub fn remove_at(&mut self, index: usize) -> Option<XmlElement> {
        if index >= self.body.children.len() {
            return None;
        }
        match self.body.children.remove(index) {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        }
    }

    /// Append at the end of the content, before the section properties
    pub fn append(&mut self, element: XmlElement) {
        let index = self.append_index();
        self.body.children.insert(index, XmlNode::Element(element));
    }

    fn append_index(&self) -> usize {
        match self.body.children.last() {
            Some(XmlNode::Element(e)) if e.is("w:sectPr") => self.body.children.len() - 1,
            _ => self.body.children.len(),
        }
    }

    /// Apply `f` to every paragraph of the body, table cells included
    pub fn for_each_paragraph_mut<F: FnMut(&mut XmlElement)>(&mut self, mut f: F) {
        self.body.visit_mut(&mut |element: &mut XmlElement| {
            if element.is("w:p") {
                f(element);
            }
        });
    }

    // ========================================================================
    // RELATIONSHIPS & CONTENT TYPES
    // ========================================================================

    /// (type, target) of a relationship id
    pub fn relationship(&self, id: &str) -> Option<(&str, &str)> {
        self.rels
            .children_named("Relationship")
            .find(|r| r.attr("Id") == Some(id))
            .map(|r| (r.attr("Type").unwrap_or(""), r.attr("Target").unwrap_or("")))
    }

    /// Add a relationship under a fresh `rIdN` and return the id
    pub fn add_relationship(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .rels
            .children_named("Relationship")
            .filter_map(|r| r.attr("Id")?.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);

        self.rels.children.push(XmlNode::Element(
            XmlElement::new("Relationship")
                .with_attr("Id", id.as_str())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        ));

        id
    }

    /// Register a default content type for a file extension if missing
    pub fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) {
        let Some(types) = self.content_types.as_mut() else {
            return;
        };

        let exists = types
            .children_named("Default")
            .any(|d| d.attr("Extension").map(|e| e.eq_ignore_ascii_case(extension)) == Some(true));

        if !exists {
            types.children.insert(
                0,
                XmlNode::Element(
                    XmlElement::new("Default")
                        .with_attr("Extension", extension)
                        .with_attr("ContentType", content_type),
                ),
            );
        }
    }

    /// Content type registered for an extension
    pub fn default_content_type(&self, extension: &str) -> Option<&str> {
        self.content_types
            .as_ref()?
            .children_named("Default")
            .find(|d| d.attr("Extension").map(|e| e.eq_ignore_ascii_case(extension)) == Some(true))?
            .attr("ContentType")
    }
}

/// MIME type for an image extension
pub fn image_content_type(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::testing::docx_bytes;

    const BODY: &str = r#"<w:p><w:r><w:t>Pirmas</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl><w:p><w:r><w:t>Antras gavejas_1</w:t></w:r></w:p><w:sectPr/>"#;

    #[test]
    fn test_load_and_query_body() {
        let doc = Document::from_bytes(&docx_bytes(BODY)).unwrap();

        assert_eq!(doc.paragraph_indices(), vec![0, 2]);
        assert_eq!(doc.table_indices(), vec![1]);
        assert_eq!(doc.find_paragraph("gavejas_1"), Some(2));
        assert_eq!(doc.find_paragraph("nėra"), None);
    }

    #[test]
    fn test_append_stays_before_section_properties() {
        let mut doc = Document::from_bytes(&docx_bytes(BODY)).unwrap();
        doc.append(XmlElement::new("w:p"));

        let last = doc.body().elements().last().unwrap();
        assert!(last.is("w:sectPr"));
        assert_eq!(doc.paragraph_indices(), vec![0, 2, 3]);
    }

    #[test]
    fn test_edits_survive_save() {
        let mut doc = Document::from_bytes(&docx_bytes(BODY)).unwrap();
        doc.remove_at(0);
        doc.insert_at(0, crate::docx::content::new_paragraph(
            &Default::default(),
            vec![crate::docx::content::new_run("Naujas", &Default::default())],
        ));

        let reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.find_paragraph("Naujas"), Some(0));
        assert!(reopened.find_paragraph("Pirmas").is_none());
        assert_eq!(reopened.tables().len(), 1);
    }

    #[test]
    fn test_for_each_paragraph_reaches_table_cells() {
        let mut doc = Document::from_bytes(&docx_bytes(BODY)).unwrap();
        let mut count = 0;
        doc.for_each_paragraph_mut(|_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_add_relationship_uses_fresh_id() {
        let mut doc = Document::from_bytes(&docx_bytes(BODY)).unwrap();
        let id = doc.add_relationship(IMAGE_RELATIONSHIP, "media/image9.png");

        // The fixture already holds rId1
        assert_eq!(id, "rId2");
        assert_eq!(doc.relationship("rId2"), Some((IMAGE_RELATIONSHIP, "media/image9.png")));
    }

    #[test]
    fn test_default_content_type_added_once() {
        let mut doc = Document::from_bytes(&docx_bytes(BODY)).unwrap();
        doc.ensure_default_content_type("png", "image/png");
        doc.ensure_default_content_type("PNG", "image/png");

        let reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.default_content_type("png"), Some("image/png"));
        assert_eq!(reopened.default_content_type("xml"), Some("application/xml"));
    }

    #[test]
    fn test_missing_main_part_is_an_error() {
        let mut package = Package::new();
        package.set_part("other.xml", b"<a/>".to_vec());
        assert!(Document::from_package(package).is_err());
    }
}
