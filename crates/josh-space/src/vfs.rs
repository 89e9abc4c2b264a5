//! The tab-delimited virtual-file-system wire format (`spec.md` §6).

/// One file carried over the virtual-file-system wire format.
#[derive(Clone, Debug, PartialEq)]
pub struct VfsEntry {
    /// The file's path as written by the sender.
    pub path: String,
    /// Decoded file content: base64-decoded if the stream marked it
    /// binary, otherwise text with four-space runs restored to tabs.
    pub content: Vec<u8>,
    /// Whether the stream marked this entry as binary (`flag == "1"`).
    pub is_binary: bool,
}

/// Parse a stream of `path` ⇥ `flag` ⇥ `content` ⇥ triples.
///
/// `spec.md` §6: "`flag ∈ {"0","1"}` (1 ⇒ base64-encoded binary, 0 ⇒
/// text with tabs converted to four spaces on write). Parsing consumes
/// triples until exhaustion." Malformed trailing data (an incomplete
/// triple) is silently dropped, matching "until exhaustion" rather than
/// raising a parse error on a short final fragment.
pub fn parse_vfs_stream(stream: &str) -> Vec<VfsEntry> {
    let mut fields = stream.split('\t');
    let mut entries = Vec::new();
    loop {
        let Some(path) = fields.next() else { break };
        let Some(flag) = fields.next() else { break };
        let Some(content) = fields.next() else { break };
        let is_binary = flag == "1";
        let decoded = if is_binary {
            use base64::engine::general_purpose::STANDARD as BASE64;
            use base64::Engine;
            BASE64.decode(content.trim()).unwrap_or_default()
        } else {
            content.replace("    ", "\t").into_bytes()
        };
        entries.push(VfsEntry {
            path: path.to_string(),
            content: decoded,
            is_binary,
        });
    }
    entries
}

/// Serialize entries back to the tab-delimited wire format, trailing
/// every field (including the last) with a tab as `spec.md` §6's grammar
/// requires.
pub fn write_vfs_stream(entries: &[VfsEntry]) -> String {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.path);
        out.push('\t');
        if entry.is_binary {
            out.push('1');
            out.push('\t');
            out.push_str(&BASE64.encode(&entry.content));
        } else {
            out.push('0');
            out.push('\t');
            let text = String::from_utf8_lossy(&entry.content);
            out.push_str(&text.replace('\t', "    "));
        }
        out.push('\t');
    }
    out
}
