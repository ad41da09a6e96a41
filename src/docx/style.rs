// 🎨 Style Descriptors - run and paragraph formatting as plain values
//
// Formatting is read off an exemplar element into a descriptor and written
// onto new elements from it. WordprocessingML requires a fixed child order
// inside w:rPr / w:pPr, so the write side emits children in that order.

use super::xml::XmlElement;
use serde::{Deserialize, Serialize};

const VAL: &str = "w:val";

// ============================================================================
// RUN STYLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    /// w:u value ("single", "double", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    /// Half points (22 = 11 pt)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    /// Hex RGB, e.g. "1F3864"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl RunStyle {
    /// Letter body font
    pub fn arial_11() -> Self {
        RunStyle {
            font: Some("Arial".to_string()),
            size: Some(22),
            ..Default::default()
        }
    }

    /// Descriptor of a w:r element (its w:rPr)
    pub fn from_run(run: &XmlElement) -> Self {
        run.child("w:rPr")
            .map(Self::from_properties)
            .unwrap_or_default()
    }

    /// Descriptor of a w:rPr element
    pub fn from_properties(rpr: &XmlElement) -> Self {
        RunStyle {
            bold: rpr.child("w:b").map(toggle_value),
            italic: rpr.child("w:i").map(toggle_value),
            underline: rpr.child("w:u").and_then(|u| u.attr(VAL)).map(String::from),
            font: rpr
                .child("w:rFonts")
                .and_then(|f| f.attr("w:ascii").or_else(|| f.attr("w:hAnsi")))
                .map(String::from),
            size: rpr
                .child("w:sz")
                .and_then(|s| s.attr(VAL))
                .and_then(|v| v.parse().ok()),
            color: rpr.child("w:color").and_then(|c| c.attr(VAL)).map(String::from),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RunStyle::default()
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }

    /// w:rPr element for this descriptor
    pub fn to_properties(&self) -> XmlElement {
        let mut rpr = XmlElement::new("w:rPr");

        if let Some(font) = &self.font {
            rpr = rpr.with_child(
                XmlElement::new("w:rFonts")
                    .with_attr("w:ascii", font.as_str())
                    .with_attr("w:hAnsi", font.as_str())
                    .with_attr("w:cs", font.as_str()),
            );
        }
        if let Some(bold) = self.bold {
            rpr = rpr.with_child(toggle_element("w:b", bold));
        }
        if let Some(italic) = self.italic {
            rpr = rpr.with_child(toggle_element("w:i", italic));
        }
        if let Some(color) = &self.color {
            rpr = rpr.with_child(XmlElement::new("w:color").with_attr(VAL, color.as_str()));
        }
        if let Some(size) = self.size {
            rpr = rpr
                .with_child(XmlElement::new("w:sz").with_attr(VAL, size.to_string()))
                .with_child(XmlElement::new("w:szCs").with_attr(VAL, size.to_string()));
        }
        if let Some(underline) = &self.underline {
            rpr = rpr.with_child(XmlElement::new("w:u").with_attr(VAL, underline.as_str()));
        }

        rpr
    }

    /// Replace the run's formatting with this descriptor
    pub fn apply_to(&self, run: &mut XmlElement) {
        run.remove_children_named("w:rPr");
        if !self.is_empty() {
            run.children.insert(0, super::xml::XmlNode::Element(self.to_properties()));
        }
    }
}

// ============================================================================
// PARAGRAPH STYLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hanging: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_rule: Option<String>,
}

/// List membership (w:numPr)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numbering {
    pub num_id: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,

    /// w:jc value ("left", "center", "both", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<Indent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Spacing>,

    #[serde(default)]
    pub keep_next: bool,

    #[serde(default)]
    pub keep_lines: bool,

    #[serde(default)]
    pub page_break_before: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub widow_control: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<Numbering>,
}

impl ParagraphStyle {
    /// Descriptor of a w:p element (its w:pPr)
    pub fn from_paragraph(paragraph: &XmlElement) -> Self {
        paragraph
            .child("w:pPr")
            .map(Self::from_properties)
            .unwrap_or_default()
    }

    pub fn from_properties(ppr: &XmlElement) -> Self {
        let indent = ppr.child("w:ind").map(|ind| Indent {
            left: ind.attr("w:left").or_else(|| ind.attr("w:start")).map(String::from),
            right: ind.attr("w:right").or_else(|| ind.attr("w:end")).map(String::from),
            first_line: ind.attr("w:firstLine").map(String::from),
            hanging: ind.attr("w:hanging").map(String::from),
        });

        let spacing = ppr.child("w:spacing").map(|s| Spacing {
            before: s.attr("w:before").map(String::from),
            after: s.attr("w:after").map(String::from),
            line: s.attr("w:line").map(String::from),
            line_rule: s.attr("w:lineRule").map(String::from),
        });

        let numbering = ppr.child("w:numPr").and_then(|num| {
            let num_id = num.child("w:numId")?.attr(VAL)?.to_string();
            let level = num
                .child("w:ilvl")
                .and_then(|l| l.attr(VAL))
                .unwrap_or("0")
                .to_string();
            Some(Numbering { num_id, level })
        });

        ParagraphStyle {
            style_id: ppr.child("w:pStyle").and_then(|s| s.attr(VAL)).map(String::from),
            alignment: ppr.child("w:jc").and_then(|j| j.attr(VAL)).map(String::from),
            indent,
            spacing,
            keep_next: ppr.child("w:keepNext").map(toggle_value).unwrap_or(false),
            keep_lines: ppr.child("w:keepLines").map(toggle_value).unwrap_or(false),
            page_break_before: ppr.child("w:pageBreakBefore").map(toggle_value).unwrap_or(false),
            widow_control: ppr.child("w:widowControl").map(toggle_value),
            numbering,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ParagraphStyle::default()
    }

    /// Builder pattern: same formatting without list membership
    pub fn without_numbering(mut self) -> Self {
        self.numbering = None;
        self
    }

    pub fn to_properties(&self) -> XmlElement {
        let mut ppr = XmlElement::new("w:pPr");

        if let Some(style_id) = &self.style_id {
            ppr = ppr.with_child(XmlElement::new("w:pStyle").with_attr(VAL, style_id.as_str()));
        }
        if self.keep_next {
            ppr = ppr.with_child(XmlElement::new("w:keepNext"));
        }
        if self.keep_lines {
            ppr = ppr.with_child(XmlElement::new("w:keepLines"));
        }
        if self.page_break_before {
            ppr = ppr.with_child(XmlElement::new("w:pageBreakBefore"));
        }
        if let Some(widow_control) = self.widow_control {
            ppr = ppr.with_child(toggle_element("w:widowControl", widow_control));
        }
        if let Some(numbering) = &self.numbering {
            ppr = ppr.with_child(
                XmlElement::new("w:numPr")
                    .with_child(XmlElement::new("w:ilvl").with_attr(VAL, numbering.level.as_str()))
                    .with_child(XmlElement::new("w:numId").with_attr(VAL, numbering.num_id.as_str())),
            );
        }
        if let Some(spacing) = &self.spacing {
            let mut element = XmlElement::new("w:spacing");
            set_opt(&mut element, "w:before", &spacing.before);
            set_opt(&mut element, "w:after", &spacing.after);
            set_opt(&mut element, "w:line", &spacing.line);
            set_opt(&mut element, "w:lineRule", &spacing.line_rule);
            ppr = ppr.with_child(element);
        }
        if let Some(indent) = &self.indent {
            let mut element = XmlElement::new("w:ind");
            set_opt(&mut element, "w:left", &indent.left);
            set_opt(&mut element, "w:right", &indent.right);
            set_opt(&mut element, "w:firstLine", &indent.first_line);
            set_opt(&mut element, "w:hanging", &indent.hanging);
            ppr = ppr.with_child(element);
        }
        if let Some(alignment) = &self.alignment {
            ppr = ppr.with_child(XmlElement::new("w:jc").with_attr(VAL, alignment.as_str()));
        }

        ppr
    }

    /// Replace the paragraph's formatting with this descriptor
    pub fn apply_to(&self, paragraph: &mut XmlElement) {
        paragraph.remove_children_named("w:pPr");
        if !self.is_empty() {
            paragraph
                .children
                .insert(0, super::xml::XmlNode::Element(self.to_properties()));
        }
    }
}

/// On/off property: present without w:val, or with a truthy one
fn toggle_value(element: &XmlElement) -> bool {
    !matches!(element.attr(VAL), Some("0") | Some("false") | Some("off"))
}

fn toggle_element(name: &str, on: bool) -> XmlElement {
    if on {
        XmlElement::new(name)
    } else {
        XmlElement::new(name).with_attr(VAL, "0")
    }
}

fn set_opt(element: &mut XmlElement, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        element.set_attr(key, value.as_str());
    }
}
