//! Code 128 (code set B) symbols for ID cards.
//!
//! A symbol is start B, one symbol per character, the modulo-103 check
//! symbol and the stop pattern. Each pattern is a run of alternating bar and
//! space widths in modules, beginning with a bar.

use std::fmt::Write;

use thiserror::Error;

/// Bar/space widths for symbol values 0..=105.
const PATTERNS: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232",
];

const STOP: &str = "2331112";
const START_B: u8 = 104;
const QUIET_ZONE_MODULES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    #[error("nothing to encode")]
    Empty,
    #[error("character {0:?} is not in Code 128 set B")]
    Unsupported(char),
}

/// An encoded Code 128 symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code128 {
    text: String,
    values: Vec<u8>,
}

/// How to draw a symbol.
#[derive(Debug, Clone, Copy)]
pub struct SvgOptions {
    pub module_width: u32,
    pub bar_height: u32,
    pub font_size: u32,
    pub show_text: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        SvgOptions {
            module_width: 2,
            bar_height: 70,
            font_size: 16,
            show_text: true,
        }
    }
}

impl Code128 {
    pub fn encode(text: &str) -> Result<Self, BarcodeError> {
        if text.is_empty() {
            return Err(BarcodeError::Empty);
        }

        let mut values = Vec::with_capacity(text.len() + 3);
        values.push(START_B);
        for c in text.chars() {
            match c {
                ' '..='\u{7f}' => values.push(c as u8 - 32),
                other => return Err(BarcodeError::Unsupported(other)),
            }
        }

        let weighted: u32 = values
            .iter()
            .enumerate()
            .map(|(i, v)| i.max(1) as u32 * u32::from(*v))
            .sum();
        values.push((weighted % 103) as u8);

        Ok(Code128 {
            text: text.to_string(),
            values,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn check_value(&self) -> u8 {
        self.values[self.values.len() - 1]
    }

    /// Run widths of the whole symbol, start to stop, without quiet zones.
    pub fn modules(&self) -> Vec<u8> {
        self.values
            .iter()
            .map(|v| PATTERNS[usize::from(*v)])
            .chain(std::iter::once(STOP))
            .flat_map(|pattern| pattern.bytes().map(|b| b - b'0'))
            .collect()
    }

    pub fn width_in_modules(&self) -> u32 {
        self.modules().iter().map(|w| u32::from(*w)).sum()
    }

    /// Renders the symbol as a standalone SVG, with the literal text under the
    /// bars for manual entry.
    pub fn to_svg(&self, options: &SvgOptions) -> String {
        let unit = options.module_width.max(1);
        let quiet = QUIET_ZONE_MODULES * unit;
        let width = self.width_in_modules() * unit + 2 * quiet;
        let text_band = if options.show_text { options.font_size + 6 } else { 0 };
        let height = options.bar_height + text_band;

        let mut svg = String::new();
        let _ = write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
            w = width,
            h = height
        );
        let _ = write!(svg, r##"<rect width="{}" height="{}" fill="#fff"/>"##, width, height);

        let mut x = quiet;
        for (i, run) in self.modules().iter().enumerate() {
            let run_width = u32::from(*run) * unit;
            if i % 2 == 0 {
                let _ = write!(
                    svg,
                    r##"<rect x="{}" y="0" width="{}" height="{}" fill="#000"/>"##,
                    x, run_width, options.bar_height
                );
            }
            x += run_width;
        }

        if options.show_text {
            let _ = write!(
                svg,
                r##"<text x="{}" y="{}" font-family="monospace" font-size="{}" text-anchor="middle">{}</text>"##,
                width / 2,
                options.bar_height + options.font_size + 2,
                options.font_size,
                escape_xml(&self.text)
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
