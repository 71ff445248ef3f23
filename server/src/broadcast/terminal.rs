//! Terminal rendering of QR challenges, for pairing without a dashboard.

use std::io::Write;

use qrcodegen::{QrCode, QrCodeEcc};
use tracing::warn;

/// Light border around the symbol, in modules.
const QUIET_ZONE: i32 = 2;

/// Render `code` as a QR symbol with half-block characters, two module rows
/// per text line.
///
/// Light modules are drawn filled so the symbol scans on a dark terminal.
/// Returns `None` when `code` is too long for a QR symbol.
pub fn render_qr(code: &str) -> Option<String> {
    let qr = QrCode::encode_text(code, QrCodeEcc::Low).ok()?;
    // The quiet zone is light; anything past it reads as dark.
    let end = qr.size() + QUIET_ZONE;
    let light = |x: i32, y: i32| {
        let inside = (0..qr.size()).contains(&x) && (0..qr.size()).contains(&y);
        let quiet = (-QUIET_ZONE..end).contains(&x) && (-QUIET_ZONE..end).contains(&y);
        if inside {
            !qr.get_module(x, y)
        } else {
            quiet
        }
    };

    let mut out = String::new();
    for y in (-QUIET_ZONE..end).step_by(2) {
        for x in -QUIET_ZONE..end {
            out.push(match (light(x, y), light(x, y + 1)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }
    Some(out)
}

/// Print the QR challenge to stdout.
pub fn print_qr(code: &str) {
    let Some(symbol) = render_qr(code) else {
        warn!(len = code.len(), "QR code too long to render in terminal");
        return;
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout
        .write_all(symbol.as_bytes())
        .and_then(|()| stdout.flush())
    {
        warn!(error = %e, "Failed to print QR code");
    }
}
