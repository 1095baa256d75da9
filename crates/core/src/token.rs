use crate::span::{Span, TextRange};

/// Integers past this magnitude no longer fit the processor's f64 registers
/// exactly.
const MAX_EXACT_INTEGER: u128 = 1 << 53;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub range: TextRange,
    pub content: String,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Comment,
    String(StringLiteral),
    Number(NumberLiteral),
    Color(ColorLiteral),
    Label,
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    /// False when the literal names an integer the runtime cannot represent.
    pub exact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLiteral {
    /// `None` when the literal is malformed or names an unknown color.
    pub rgba: Option<Rgba>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringLiteral {
    pub color_tags: Vec<ColorTag>,
}

/// A `[name]`, `[#rrggbb]` or `[]` markup tag embedded in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTag {
    pub span: Span,
    pub name: String,
    pub rgba: Option<Rgba>,
}

impl Token {
    pub fn new(range: TextRange, content: impl Into<String>) -> Self {
        let content = content.into();
        let kind = classify(&content, range.span.start);
        Self {
            range,
            content,
            kind,
        }
    }

    pub fn span(&self) -> Span {
        self.range.span
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier)
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind, TokenKind::Label)
    }

    pub fn number(&self) -> Option<NumberLiteral> {
        match self.kind {
            TokenKind::Number(number) => Some(number),
            _ => None,
        }
    }

    /// Label name without the trailing colon.
    pub fn label_name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Label => self.content.strip_suffix(':'),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TokenKind::Comment => "comment",
            TokenKind::String(_) => "string",
            TokenKind::Number(_) => "number",
            TokenKind::Color(_) => "color",
            TokenKind::Label => "label",
            TokenKind::Identifier => "identifier",
        }
    }
}

fn classify(content: &str, offset: usize) -> TokenKind {
    if content.starts_with('#') {
        return TokenKind::Comment;
    }
    if content.starts_with('"') {
        return TokenKind::String(parse_string_literal(content, offset));
    }
    if let Some(rest) = content.strip_prefix('%') {
        return TokenKind::Color(ColorLiteral {
            rgba: parse_color_literal(rest),
        });
    }
    if let Some(number) = parse_number(content) {
        return TokenKind::Number(number);
    }
    if content.len() > 1 && content.ends_with(':') {
        return TokenKind::Label;
    }
    TokenKind::Identifier
}

pub fn parse_number(text: &str) -> Option<NumberLiteral> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if body.is_empty() {
        return None;
    }

    let radix_digits = body
        .strip_prefix("0x")
        .map(|digits| (16, digits))
        .or_else(|| body.strip_prefix("0b").map(|digits| (2, digits)));
    if let Some((radix, digits)) = radix_digits {
        return parse_radix_integer(digits, radix, negative);
    }

    if !is_decimal_shape(body) {
        return None;
    }
    let value: f64 = body.parse().ok()?;
    let is_integer = body.bytes().all(|byte| byte.is_ascii_digit());
    let exact = !is_integer
        || body
            .parse::<u128>()
            .is_ok_and(|integer| integer <= MAX_EXACT_INTEGER);
    Some(NumberLiteral {
        value: if negative { -value } else { value },
        exact,
    })
}

fn parse_radix_integer(digits: &str, radix: u32, negative: bool) -> Option<NumberLiteral> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0f64;
    let mut integer = Some(0u128);
    for ch in digits.chars() {
        let digit = ch.to_digit(radix)?;
        value = value * f64::from(radix) + f64::from(digit);
        integer = integer
            .and_then(|integer| integer.checked_mul(u128::from(radix)))
            .and_then(|integer| integer.checked_add(u128::from(digit)));
    }
    Some(NumberLiteral {
        value: if negative { -value } else { value },
        exact: integer.is_some_and(|integer| integer <= MAX_EXACT_INTEGER),
    })
}

/// digits [ "." digits ] [ ("e"|"E") [sign] digits ], with at least one
/// mantissa digit.
fn is_decimal_shape(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut index = 0;
    let mut mantissa_digits = 0;
    while index < bytes.len() && bytes[index].is_ascii_digit() {
        index += 1;
        mantissa_digits += 1;
    }
    if index < bytes.len() && bytes[index] == b'.' {
        index += 1;
        while index < bytes.len() && bytes[index].is_ascii_digit() {
            index += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if index < bytes.len() && matches!(bytes[index], b'e' | b'E') {
        index += 1;
        if index < bytes.len() && matches!(bytes[index], b'+' | b'-') {
            index += 1;
        }
        let exponent_start = index;
        while index < bytes.len() && bytes[index].is_ascii_digit() {
            index += 1;
        }
        if index == exponent_start {
            return false;
        }
    }
    index == bytes.len()
}

fn parse_color_literal(rest: &str) -> Option<Rgba> {
    if let Some(name) = rest.strip_prefix('[').and_then(|inner| inner.strip_suffix(']')) {
        return named_color(name);
    }
    parse_hex_color(rest)
}

fn parse_hex_color(hex: &str) -> Option<Rgba> {
    if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 0xff };
    Some(Rgba::new(channel(0)?, channel(2)?, channel(4)?, alpha))
}

pub fn named_color(name: &str) -> Option<Rgba> {
    let rgb = match name.to_ascii_lowercase().as_str() {
        "clear" => return Some(Rgba::new(0, 0, 0, 0)),
        "black" => 0x000000,
        "white" => 0xffffff,
        "lightgray" => 0xbfbfbf,
        "gray" => 0x7f7f7f,
        "darkgray" => 0x3f3f3f,
        "blue" => 0x0000ff,
        "navy" => 0x00007f,
        "royal" => 0x4169e1,
        "slate" => 0x708090,
        "sky" => 0x87ceeb,
        "cyan" => 0x00ffff,
        "teal" => 0x007f7f,
        "green" => 0x00ff00,
        "acid" => 0x7fff00,
        "lime" => 0x32cd32,
        "forest" => 0x228b22,
        "olive" => 0x6b8e23,
        "yellow" => 0xffff00,
        "gold" => 0xffd700,
        "goldenrod" => 0xdaa520,
        "orange" => 0xffa500,
        "brown" => 0x8b4513,
        "tan" => 0xd2b48c,
        "brick" => 0xb22222,
        "red" => 0xff0000,
        "scarlet" => 0xff341c,
        "crimson" => 0xdc143c,
        "coral" => 0xff7f50,
        "salmon" => 0xfa8072,
        "pink" => 0xff69b4,
        "magenta" => 0xff00ff,
        "purple" => 0xa020f0,
        "violet" => 0xee82ee,
        "maroon" => 0xb03060,
        "accent" => 0xffd37f,
        "unlaunched" => 0x8982ed,
        "highlight" => 0xf4ba6e,
        "stat" => 0xffd37f,
        "negstat" => 0xe55454,
        _ => return None,
    };
    Some(Rgba::opaque(rgb))
}

fn parse_string_literal(content: &str, offset: usize) -> StringLiteral {
    let bytes = content.as_bytes();
    let mut color_tags = Vec::new();
    let mut index = 1;
    while index < bytes.len() {
        if bytes[index] != b'[' {
            index += 1;
            continue;
        }
        if bytes.get(index + 1) == Some(&b'[') {
            index += 2;
            continue;
        }
        let Some(close) = content[index + 1..].find(['[', ']', '"']) else {
            break;
        };
        let close = index + 1 + close;
        if bytes[close] != b']' {
            index = close;
            continue;
        }
        let name = &content[index + 1..close];
        let rgba = match name.strip_prefix('#') {
            Some(hex) => parse_hex_color(hex),
            None => named_color(name),
        };
        if name.is_empty() || rgba.is_some() {
            color_tags.push(ColorTag {
                span: Span::new(offset + index, offset + close + 1),
                name: name.to_string(),
                rgba,
            });
        }
        index = close + 1;
    }
    StringLiteral { color_tags }
}
