// SPDX-License-Identifier: MIT OR Apache-2.0
//! Argument value parsers.

use texprep_graph::{Position, Rgba};

/// Parse `#rrggbb` or `rrggbb` into an opaque color
pub fn parse_hex_color(value: &str) -> Result<Rgba, String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("'{value}' is not a #rrggbb color"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map(|v| f32::from(v) / 255.0)
            .map_err(|e| e.to_string())
    };
    Ok(Rgba::rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Parse `x,y` into a graph position
pub fn parse_position(value: &str) -> Result<Position, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("'{value}' is not an x,y position"))?;
    let coordinate = |s: &str| s.trim().parse::<f32>().map_err(|e| format!("'{s}': {e}"));
    Ok(Position::new(coordinate(x)?, coordinate(y)?))
}
