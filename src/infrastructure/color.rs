// Color string normalization to lowercase `#rrggbb`

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("white", [255, 255, 255]),
    ("maroon", [128, 0, 0]),
    ("red", [255, 0, 0]),
    ("purple", [128, 0, 128]),
    ("fuchsia", [255, 0, 255]),
    ("magenta", [255, 0, 255]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("olive", [128, 128, 0]),
    ("yellow", [255, 255, 0]),
    ("navy", [0, 0, 128]),
    ("blue", [0, 0, 255]),
    ("teal", [0, 128, 128]),
    ("aqua", [0, 255, 255]),
    ("cyan", [0, 255, 255]),
    ("orange", [255, 165, 0]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
];

/// Normalize a CSS-ish color string. Returns `None` when the input is not
/// a recognizable color.
pub fn normalize_color(input: &str) -> Option<String> {
    let s = input.trim().to_ascii_lowercase();
    let rgb = if let Some(hex) = s.strip_prefix('#') {
        parse_hex(hex)?
    } else if let Some(args) = functional_args(&s) {
        parse_rgb_args(args)?
    } else if let Some(hex) = parse_hex(&s) {
        hex
    } else {
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, rgb)| *rgb)?
    };
    Some(to_hex(rgb))
}

fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().take(3).enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 16 + v;
            }
            Some(rgb)
        }
        // Alpha channel is dropped.
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b])
        }
        _ => None,
    }
}

fn functional_args(s: &str) -> Option<&str> {
    let body = s.strip_prefix("rgba(").or_else(|| s.strip_prefix("rgb("))?;
    body.strip_suffix(')')
}

fn parse_rgb_args(args: &str) -> Option<[u8; 3]> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let mut rgb = [0u8; 3];
    for (i, part) in parts.iter().take(3).enumerate() {
        let value = if let Some(pct) = part.strip_suffix('%') {
            pct.parse::<f64>().ok()? * 2.55
        } else {
            part.parse::<f64>().ok()?
        };
        if !value.is_finite() {
            return None;
        }
        rgb[i] = value.clamp(0.0, 255.0).round() as u8;
    }
    Some(rgb)
}
