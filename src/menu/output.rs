use serde::de::IgnoredAny;

pub const SUCCESS_BANNER: &str = "######## Success ########";
pub const RESULT_PREFIX: &str = "######## Result:";
pub const NO_SUCH_OPTION: &str = "No such option";

/// Re-lays out a JSON payload one element per line with no nesting indent.
///
/// Only whitespace outside strings changes. String tokens, escapes, number
/// text and repeated keys are copied from the payload as received.
pub fn format_json(payload: &[u8]) -> Result<String, serde_json::Error> {
    serde_json::from_slice::<IgnoredAny>(payload)?;

    let mut out = Vec::with_capacity(payload.len() + payload.len() / 4);
    let mut in_string = false;
    let mut escaped = false;
    // a container was just opened and its first newline is still owed
    let mut opened = false;

    for &byte in payload {
        if in_string {
            out.push(byte);
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        if byte.is_ascii_whitespace() {
            continue;
        }

        let after_open = std::mem::take(&mut opened);
        let closing = matches!(byte, b'}' | b']');
        if after_open && !closing {
            out.push(b'\n');
        }

        match byte {
            b'"' => {
                in_string = true;
                out.push(byte);
            }
            b'{' | b'[' => {
                out.push(byte);
                opened = true;
            }
            b'}' | b']' => {
                // empty containers stay on one line
                if !after_open {
                    out.push(b'\n');
                }
                out.push(byte);
            }
            b',' => out.extend_from_slice(b",\n"),
            b':' => out.extend_from_slice(b": "),
            _ => out.push(byte),
        }
    }

    // string bytes are copied verbatim, so invalid UTF-8 can only come from the payload
    Ok(String::from_utf8_lossy(&out).into_owned())
}
