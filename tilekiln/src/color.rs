use anyhow::{bail, Result};

/// Parses a `#RRGGBB` or `#RRGGBBAA` color literal into the packed RGBA
/// fill color the pyramid generator paints behind missing children.
pub fn parse_fill_color(value: &str) -> Result<[u8; 4]> {
	let hex = value.strip_prefix('#').unwrap_or(value);
	let bytes = match hex.len() {
		6 => [&hex[0..2], &hex[2..4], &hex[4..6], "ff"],
		8 => [&hex[0..2], &hex[2..4], &hex[4..6], &hex[6..8]],
		_ => bail!("fill color {value:?} must be `#RRGGBB` or `#RRGGBBAA`"),
	};

	let mut out = [0u8; 4];
	for (i, part) in bytes.into_iter().enumerate() {
		out[i] = u8::from_str_radix(part, 16).map_err(|_| anyhow::anyhow!("fill color {value:?} contains non-hex digits"))?;
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_rgb_with_implicit_full_alpha() {
		assert_eq!(parse_fill_color("#112233").unwrap(), [0x11, 0x22, 0x33, 0xff]);
	}

	#[test]
	fn parses_rgba_explicitly() {
		assert_eq!(parse_fill_color("#11223380").unwrap(), [0x11, 0x22, 0x33, 0x80]);
	}

	#[test]
	fn accepts_a_leading_hash_or_not() {
		assert_eq!(parse_fill_color("ffffff").unwrap(), parse_fill_color("#ffffff").unwrap());
	}

	#[test]
	fn rejects_malformed_input() {
		assert!(parse_fill_color("#fff").is_err());
		assert!(parse_fill_color("#gggggg").is_err());
	}
}
