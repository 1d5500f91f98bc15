/*
 *  display/text.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Font sizing, ellipsis and two line wrapping for the text blocks
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::Baseline;
use u8g2_fonts::{fonts, U8g2TextStyle};

pub const ELLIPSIS: &str = "...";

type StyleFn = fn(Rgb888) -> U8g2TextStyle<Rgb888>;

// largest first
const BOLD: [StyleFn; 9] = [
    |c| U8g2TextStyle::new(fonts::u8g2_font_fub42_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_fub30_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_fub25_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvB24_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvB18_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvB14_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvB12_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvB10_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvB08_tf, c),
];

const REGULAR: [StyleFn; 6] = [
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvR24_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvR18_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvR14_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvR12_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvR10_tf, c),
    |c| U8g2TextStyle::new(fonts::u8g2_font_helvR08_tf, c),
];

/// Largest face whose line height fits `height`; the smallest face otherwise.
pub fn style_for_height(height: u32, bold: bool, color: Rgb888) -> U8g2TextStyle<Rgb888> {
    let faces: &[StyleFn] = if bold { &BOLD } else { &REGULAR };
    let mut chosen = faces[faces.len() - 1](color);
    for make in faces {
        let style = make(color);
        if style.line_height() <= height {
            chosen = style;
            break;
        }
    }
    chosen
}

/// Advance width of `text` in `style`
pub fn text_width<S: TextRenderer>(style: &S, text: &str) -> u32 {
    style.measure_string(text, Point::zero(), Baseline::Top).next_position.x.max(0) as u32
}

/// The bundled faces cover Latin-1 only.
pub fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else if (c as u32) > 0xff { '?' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Trim `text` until it fits `max_width`, marking the cut with an ellipsis.
pub fn ellipsize<S: TextRenderer>(style: &S, text: &str, max_width: u32) -> String {
    if text_width(style, text) <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    // binary search the longest prefix that fits with the ellipsis appended
    let (mut lo, mut hi) = (0usize, chars.len());
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        let candidate: String = chars[..mid].iter().collect::<String>().trim_end().to_string() + ELLIPSIS;
        if text_width(style, &candidate) <= max_width {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    if lo == 0 {
        return if text_width(style, ELLIPSIS) <= max_width { ELLIPSIS.to_string() } else { String::new() };
    }
    chars[..lo].iter().collect::<String>().trim_end().to_string() + ELLIPSIS
}

/// Greedy word wrap into at most two lines, the second ellipsized.
pub fn wrap_two_lines<S: TextRenderer>(style: &S, text: &str, max_width: u32) -> Vec<String> {
    if text_width(style, text) <= max_width {
        return vec![text.to_string()];
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut first = String::new();
    let mut used = 0;
    for word in &words {
        let candidate = if first.is_empty() { word.to_string() } else { format!("{} {}", first, word) };
        if text_width(style, &candidate) > max_width {
            break;
        }
        first = candidate;
        used += 1;
    }
    if used == 0 {
        // a single word wider than the block
        return vec![ellipsize(style, text, max_width)];
    }
    let rest = words[used..].join(" ");
    if rest.is_empty() {
        return vec![first];
    }
    vec![first, ellipsize(style, &rest, max_width)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};

    // fixed advance makes the arithmetic exact: 6 px per char
    fn mono() -> MonoTextStyle<'static, Rgb888> {
        MonoTextStyle::new(&FONT_6X10, Rgb888::BLACK)
    }

    #[test]
    fn test_ellipsize_fits_untouched() {
        assert_eq!(ellipsize(&mono(), "short", 60), "short");
    }

    #[test]
    fn test_ellipsize_cuts() {
        let out = ellipsize(&mono(), "Never Gonna Give You Up", 60);
        assert!(out.ends_with(ELLIPSIS));
        assert!(text_width(&mono(), &out) <= 60);
        assert_eq!(out, "Never G...");
    }

    #[test]
    fn test_ellipsize_too_narrow() {
        assert_eq!(ellipsize(&mono(), "abcdef", 5), "");
    }

    #[test]
    fn test_wrap_two_lines() {
        let lines = wrap_two_lines(&mono(), "Never Gonna Give You Up Again And Again", 60);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Never");
        assert!(lines[1].ends_with(ELLIPSIS));
        let one = wrap_two_lines(&mono(), "Hello", 60);
        assert_eq!(one, vec!["Hello".to_string()]);
    }

    #[test]
    fn test_printable_replaces_wide_chars() {
        assert_eq!(printable(" Café 東京\n"), "Café ??");
    }

    #[test]
    fn test_style_for_height_monotonic() {
        let small = style_for_height(12, true, Rgb888::BLACK);
        let large = style_for_height(200, true, Rgb888::BLACK);
        assert!(small.line_height() <= large.line_height());
        assert!(large.line_height() <= 200);
    }
}
