//! Parse raw response header lines as delivered by libcurl.

/// Head of one response block: status code plus `(name, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ResponseHead {
    pub status: u32,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Feed one header line. A status line (`HTTP/...`) starts a new block,
    /// so after redirects only the final response's headers remain.
    pub(crate) fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if let Some(status) = parse_status_line(line) {
            self.status = status;
            self.headers.clear();
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            self.headers
                .push((name.trim().to_string(), value.trim().to_string()));
        }
    }
}

/// `HTTP/1.1 200 OK` -> 200. `HTTP/2 404` -> 404.
fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(lines: &[&str]) -> ResponseHead {
        let mut h = ResponseHead::default();
        for l in lines {
            h.push_line(l);
        }
        h
    }

    #[test]
    fn status_and_headers() {
        let h = head(&[
            "HTTP/1.1 200 OK\r\n",
            "Content-Length: 12345\r\n",
            "Accept-Ranges: bytes\r\n",
            "\r\n",
        ]);
        assert_eq!(h.status, 200);
        assert_eq!(
            h.headers,
            vec![
                ("Content-Length".to_string(), "12345".to_string()),
                ("Accept-Ranges".to_string(), "bytes".to_string()),
            ]
        );
    }

    #[test]
    fn redirect_keeps_final_block_only() {
        let h = head(&[
            "HTTP/1.1 302 Found",
            "Location: /other",
            "Content-Length: 0",
            "",
            "HTTP/2 200",
            "content-length: 7",
        ]);
        assert_eq!(h.status, 200);
        assert_eq!(
            h.headers,
            vec![("content-length".to_string(), "7".to_string())]
        );
    }

    #[test]
    fn value_with_colon_kept_whole() {
        let h = head(&["HTTP/1.0 200 OK", "Location: http://example.com:8080/x"]);
        assert_eq!(h.headers[0].1, "http://example.com:8080/x");
    }

    #[test]
    fn garbage_status_line_ignored() {
        let h = head(&["HTTP/1.1 abc", "X: y"]);
        assert_eq!(h.status, 0);
        assert_eq!(h.headers.len(), 1);
    }
}
