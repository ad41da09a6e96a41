// 📄 Word Documents - just enough WordprocessingML for letter assembly

pub mod content;
pub mod document;
pub mod package;
pub mod style;
#[cfg(test)]
pub(crate) mod testing;
pub mod xml;

pub use content::{
    cell_text, is_bullet, new_paragraph, new_run, paragraph_text, replace_in_runs, row_cells,
    runs, set_cell_text, table_rows,
};
pub use document::Document;
pub use package::Package;
pub use style::{Numbering, ParagraphStyle, RunStyle};
pub use xml::{XmlElement, XmlNode};
