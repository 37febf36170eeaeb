//! Hex dump rendering

use std::fmt::Write;

/// Bytes rendered per line.
pub const BYTES_PER_LINE: usize = 16;

/// Classic dump: `OOOOOOOO  b0 b1 .. b15  |ascii|`, one line per 16 bytes.
/// Short final lines are padded so the ASCII column stays aligned.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4 + data.len() / BYTES_PER_LINE * 16);

    for (line_no, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        if line_no > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:08x}  ", line_no * BYTES_PER_LINE);

        for i in 0..BYTES_PER_LINE {
            if i > 0 {
                out.push(' ');
            }
            match chunk.get(i) {
                Some(b) => {
                    let _ = write!(out, "{:02x}", b);
                }
                None => out.push_str("  "),
            }
        }

        out.push_str("  |");
        out.extend(chunk.iter().map(|&b| printable(b)));
        out.push('|');
    }

    out
}

fn printable(b: u8) -> char {
    if (0x20..=0x7e).contains(&b) {
        b as char
    } else {
        '.'
    }
}
