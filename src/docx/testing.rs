// 🧪 Fixtures - minimal .docx packages built from a body snippet
//
// Unit tests only; tests/common carries the integration-test copy.

use super::package::Package;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Builds a package part by part
pub struct DocxFixture {
    body: String,
    relationships: Vec<(String, String, String)>,
    extra_parts: Vec<(String, Vec<u8>)>,
}

impl DocxFixture {
    pub fn new(body: &str) -> Self {
        DocxFixture {
            body: body.to_string(),
            relationships: vec![(
                "rId1".to_string(),
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles"
                    .to_string(),
                "styles.xml".to_string(),
            )],
            extra_parts: Vec::new(),
        }
    }

    /// Builder pattern: an image part referenced by `id`
    pub fn with_image(mut self, id: &str, name: &str, data: &[u8]) -> Self {
        self.relationships.push((
            id.to_string(),
            super::document::IMAGE_RELATIONSHIP.to_string(),
            format!("media/{}", name),
        ));
        self.extra_parts
            .push((format!("word/media/{}", name), data.to_vec()));
        self
    }

    pub fn package(&self) -> Package {
        let mut package = Package::new();

        package.set_part(
            "[Content_Types].xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
                r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
                r#"</Types>"#
            )
            .as_bytes()
            .to_vec(),
        );

        package.set_part(
            "_rels/.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
                r#"</Relationships>"#
            )
            .as_bytes()
            .to_vec(),
        );

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}" xmlns:r="{}" xmlns:wp="{}" xmlns:a="{}" xmlns:pic="{}"><w:body>{}</w:body></w:document>"#,
            W_NS, R_NS, WP_NS, A_NS, PIC_NS, self.body
        );
        package.set_part("word/document.xml", document.into_bytes());

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, rel_type, target) in &self.relationships {
            rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id, rel_type, target
            ));
        }
        rels.push_str("</Relationships>");
        package.set_part("word/_rels/document.xml.rels", rels.into_bytes());

        package.set_part(
            "word/styles.xml",
            format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}"/>"#, W_NS)
                .into_bytes(),
        );

        for (name, data) in &self.extra_parts {
            package.set_part(name, data.clone());
        }

        package
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.package()
            .to_bytes()
            .unwrap_or_default()
    }
}

/// Package bytes for a document with `body` inside w:body
pub fn docx_bytes(body: &str) -> Vec<u8> {
    DocxFixture::new(body).bytes()
}

/// Body paragraph with one plain run
pub fn para(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

/// Inline picture run referencing an image relationship
pub fn picture_run(rel_id: &str) -> String {
    format!(
        concat!(
            r#"<w:r><w:drawing><wp:inline><wp:extent cx="952500" cy="476250"/><wp:docPr id="1" name="Picture 1"/>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:blipFill><a:blip r:embed="{}"/></pic:blipFill></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
        ),
        rel_id
    )
}
