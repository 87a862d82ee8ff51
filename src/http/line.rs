//! CRLF line scanning over the read buffer.

use crate::http::buffer::{ReadBuffer, Span};

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Outcome of looking for the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// A complete line, terminator excluded.
    Ok(Span),
    /// A bare CR or a bare LF.
    Bad,
    /// No terminator yet; more bytes are needed.
    Open,
}

/// Scans forward from the scan position for a CRLF.
///
/// On success both terminator bytes are overwritten with NUL, the scan
/// position moves past them and the next line starts there; the returned
/// span covers the line itself.
/// Re-invoking after more bytes arrive resumes where the last call stopped.
pub fn scan_line(buf: &mut ReadBuffer) -> LineStatus {
    let end = buf.write_pos();
    let mut idx = buf.scan_pos();

    while idx < end {
        match buf.byte(idx) {
            CR => {
                if idx + 1 == end {
                    // Stay on the CR so the next call sees it again.
                    buf.set_scan_pos(idx);
                    return LineStatus::Open;
                }
                if buf.byte(idx + 1) != LF {
                    buf.set_scan_pos(idx);
                    return LineStatus::Bad;
                }
                return terminate(buf, idx);
            }
            LF => {
                // A CR never stays behind the scan position, so this LF is bare.
                buf.set_scan_pos(idx);
                return LineStatus::Bad;
            }
            _ => idx += 1,
        }
    }

    buf.set_scan_pos(idx);
    LineStatus::Open
}

fn terminate(buf: &mut ReadBuffer, cr: usize) -> LineStatus {
    let line = buf.span(buf.line_start(), cr);
    buf.set_byte(cr, 0);
    buf.set_byte(cr + 1, 0);
    buf.set_scan_pos(cr + 2);
    buf.mark_line_start();
    LineStatus::Ok(line)
}
