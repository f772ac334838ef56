//! Common utilities

use std::fmt::Write;

/// Render bytes as space-separated lowercase hex
///
/// With `cols`, a line break follows every `cols` bytes; without it (or with
/// zero) everything is on one line.
pub fn hex_dump(data: &[u8], cols: Option<usize>) -> String {
    let cols = match cols {
        Some(n) if n > 0 => n,
        _ => data.len().max(1),
    };

    data.chunks(cols)
        .map(|line| {
            let mut s = String::with_capacity(line.len() * 3);
            for (i, b) in line.iter().enumerate() {
                if i > 0 {
                    s.push(' ');
                }
                let _ = write!(s, "{:02x}", b);
            }
            s
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate byte strings of varying lengths
pub fn pack_var<I, B>(items: I) -> Vec<u8>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    items.into_iter().fold(Vec::new(), |mut out, item| {
        out.extend_from_slice(item.as_ref());
        out
    })
}
