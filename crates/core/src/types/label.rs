//! Printable label styles.
//!
//! A style fixes how many labels sit side by side on a sheet and how each
//! label arranges its code symbol and text.

use serde::{Deserialize, Serialize};

/// The machine-readable symbol drawn on a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Qr,
    Barcode,
}

/// How the symbol and text sit relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    /// Symbol on the left, text on the right.
    Horizontal,
    /// Symbol above text.
    Vertical,
}

/// Text alignment inside a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
}

impl TextAlign {
    /// CSS `text-align` value.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
        }
    }
}

/// Paper stock the labels are printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    /// A4 adhesive label sheet.
    #[default]
    LabelSheet,
    /// Continuous thermal roll.
    Thermal,
}

/// Linear barcode symbology for barcode styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    #[default]
    Code128,
    Ean13,
}

impl BarcodeFormat {
    /// Name shown in the print options.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Code128 => "Code 128",
            Self::Ean13 => "EAN-13",
        }
    }
}

/// A named label layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelStyle {
    pub id: u8,
    pub name: &'static str,
    pub symbol: SymbolKind,
    pub arrangement: Arrangement,
    /// Labels per row on the sheet.
    pub columns: usize,
    /// QR edge length or barcode bar height, in pixels.
    pub symbol_size_px: u32,
    pub text_align: TextAlign,
    /// Whether the code itself is printed under the symbol.
    pub shows_code_caption: bool,
}

impl LabelStyle {
    pub const QR_HORIZONTAL: Self = Self {
        id: 1,
        name: "QR Horizontal",
        symbol: SymbolKind::Qr,
        arrangement: Arrangement::Horizontal,
        columns: 2,
        symbol_size_px: 80,
        text_align: TextAlign::Left,
        shows_code_caption: false,
    };

    pub const QR_VERTICAL: Self = Self {
        id: 2,
        name: "QR Vertical",
        symbol: SymbolKind::Qr,
        arrangement: Arrangement::Vertical,
        columns: 3,
        symbol_size_px: 100,
        text_align: TextAlign::Center,
        shows_code_caption: false,
    };

    pub const BARCODE_TYPE_1: Self = Self {
        id: 3,
        name: "Barcode Type 1",
        symbol: SymbolKind::Barcode,
        arrangement: Arrangement::Vertical,
        columns: 3,
        symbol_size_px: 50,
        text_align: TextAlign::Center,
        shows_code_caption: false,
    };

    pub const BARCODE_TYPE_2: Self = Self {
        id: 4,
        name: "Barcode Type 2",
        symbol: SymbolKind::Barcode,
        arrangement: Arrangement::Vertical,
        columns: 3,
        symbol_size_px: 40,
        text_align: TextAlign::Center,
        shows_code_caption: true,
    };

    /// All built-in styles, in menu order.
    pub const PRESETS: [Self; 4] = [
        Self::QR_HORIZONTAL,
        Self::QR_VERTICAL,
        Self::BARCODE_TYPE_1,
        Self::BARCODE_TYPE_2,
    ];

    /// Look up a built-in style by id.
    #[must_use]
    pub fn by_id(id: u8) -> Option<Self> {
        Self::PRESETS.into_iter().find(|style| style.id == id)
    }

    /// Inner padding of one label, in millimetres.
    #[must_use]
    pub const fn padding_mm(&self) -> u32 {
        match self.symbol {
            SymbolKind::Qr => 2,
            SymbolKind::Barcode => 1,
        }
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self::QR_HORIZONTAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_unique_ids() {
        for (i, a) in LabelStyle::PRESETS.iter().enumerate() {
            for b in LabelStyle::PRESETS.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(LabelStyle::by_id(2), Some(LabelStyle::QR_VERTICAL));
        assert_eq!(LabelStyle::by_id(9), None);
        assert_eq!(LabelStyle::default().columns, 2);
    }

    #[test]
    fn test_padding_depends_on_symbol() {
        assert_eq!(LabelStyle::QR_VERTICAL.padding_mm(), 2);
        assert_eq!(LabelStyle::BARCODE_TYPE_1.padding_mm(), 1);
    }
}
