//! Font descriptors.
//!
//! The document payload stores fonts as a single descriptor string
//! (`"Helvetica 14 bold italic"`); exporters need the resolved
//! family/size/weight/slant, so both forms live here.

use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn name(&self) -> &'static str {
        match self {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        }
    }
}

/// Font slant options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontSlant {
    #[default]
    Roman,
    Italic,
}

impl FontSlant {
    pub fn name(&self) -> &'static str {
        match self {
            FontSlant::Roman => "roman",
            FontSlant::Italic => "italic",
        }
    }
}

/// A resolved font: family, size, weight, slant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    /// Size in canvas units. Sizes are formatted as whole numbers in the
    /// descriptor string.
    pub size: f64,
    pub weight: FontWeight,
    pub slant: FontSlant,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            size: 12.0,
            weight: FontWeight::Normal,
            slant: FontSlant::Roman,
        }
    }
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            ..Default::default()
        }
    }

    /// Return a copy with the size multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            size: self.size * factor,
            ..self.clone()
        }
    }

    /// Parse a descriptor string.
    ///
    /// Trailing tokens are consumed right-to-left: style keywords first
    /// (`bold`, `italic`, `normal`, `roman`), then a numeric size; whatever
    /// remains is the family (which may contain spaces). Missing pieces
    /// default, so a bare family name parses.
    pub fn parse(descriptor: &str) -> Self {
        let mut tokens: Vec<&str> = descriptor.split_whitespace().collect();
        let mut weight = FontWeight::Normal;
        let mut slant = FontSlant::Roman;

        while let Some(&last) = tokens.last() {
            match last.to_ascii_lowercase().as_str() {
                "bold" => weight = FontWeight::Bold,
                "italic" => slant = FontSlant::Italic,
                "normal" | "roman" => {}
                _ => break,
            }
            tokens.pop();
        }

        let size = match tokens.last().and_then(|t| t.parse::<f64>().ok()) {
            Some(s) if s > 0.0 => {
                tokens.pop();
                s
            }
            _ => 12.0,
        };

        let family = if tokens.is_empty() {
            FontSpec::default().family
        } else {
            tokens.join(" ")
        };

        Self {
            family,
            size,
            weight,
            slant,
        }
    }

    /// Format as the descriptor string stored in the payload.
    pub fn descriptor(&self) -> String {
        let mut out = format!("{} {}", self.family, self.size.round().max(1.0) as i64);
        if self.weight == FontWeight::Bold {
            out.push_str(" bold");
        }
        if self.slant == FontSlant::Italic {
            out.push_str(" italic");
        }
        out
    }
}
