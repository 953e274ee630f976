//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use crate::parser::{
        parse_header_line, parse_request_line, Error, HeaderTable, HttpVersion, Method, RequestLine,
    };

    fn headers_from(lines: &[&str]) -> HeaderTable {
        let mut headers = HeaderTable::new();
        for line in lines {
            parse_header_line(line, &mut headers);
        }
        headers
    }

    #[test]
    fn test_parse_simple_request_line() {
        let line = parse_request_line("GET /index.html HTTP/1.1").unwrap();
        assert_eq!(line.method(), "GET");
        assert_eq!(line.target(), "/index.html");
        assert_eq!(line.version(), "HTTP/1.1");
        assert_eq!(line.parsed_method(), Method::Get);
        assert_eq!(line.parsed_version().unwrap(), HttpVersion::Http11);
    }

    #[test]
    fn test_request_line_target_is_decoded() {
        let line = parse_request_line("GET /my%20file.txt HTTP/1.0").unwrap();
        assert_eq!(line, RequestLine::new("GET", "/my file.txt", "HTTP/1.0"));
    }

    #[test]
    fn test_too_few_tokens() {
        let result = parse_request_line("GET /index.html");
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref l)) if l == "GET /index.html"));

        let result = parse_request_line("GET");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_too_many_tokens() {
        let result = parse_request_line("GET /index.html HTTP/1.1 extra");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_double_space_is_not_collapsed() {
        let result = parse_request_line("GET  /index.html HTTP/1.1");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_empty_request_line() {
        assert!(matches!(parse_request_line(""), Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_bad_escape_in_target() {
        let result = parse_request_line("GET /%zz HTTP/1.1");
        assert!(matches!(result, Err(Error::InvalidPercentEncoding(_))));
    }

    #[test]
    fn test_unknown_tokens_still_parse() {
        // The handler decides what to do with these, the parser only frames them
        let line = parse_request_line("BREW /pot HTCPCP/1.0").unwrap();
        assert_eq!(line.parsed_method(), Method::Other("BREW".to_string()));
        assert!(matches!(line.parsed_version(), Err(Error::InvalidVersion(ref v)) if v == "HTCPCP/1.0"));
    }

    #[test]
    fn test_get_matches_in_any_case() {
        assert_eq!(Method::from("get"), Method::Get);
        assert_eq!(Method::from("GeT"), Method::Get);
        assert!(Method::from("GET").is_served());
        assert!(!Method::from("POST").is_served());
        assert_eq!(Method::from("post").to_string(), "post");
    }

    #[test]
    fn test_persistent_versions() {
        assert!(HttpVersion::Http11.is_persistent_by_default());
        assert!(!HttpVersion::Http10.is_persistent_by_default());
    }

    #[test]
    fn test_simple_header() {
        let headers = headers_from(&["Host: example.com"]);
        assert_eq!(headers.get("Host").unwrap(), ["example.com"]);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_repeated_and_comma_separated_headers_agree() {
        let repeated = headers_from(&["X: a", "X: b"]);
        let listed = headers_from(&["X: a,b"]);
        assert_eq!(repeated.get("X").unwrap(), ["a", "b"]);
        assert_eq!(listed.get("X").unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_values_keep_arrival_order_across_forms() {
        let headers = headers_from(&["Accept: text/html, text/plain", "accept: */*"]);
        assert_eq!(headers.get("ACCEPT").unwrap(), ["text/html", "text/plain", "*/*"]);
    }

    #[test]
    fn test_case_insensitive_names_keep_first_casing() {
        let headers = headers_from(&["X-Trace: 1", "x-trace: 2"]);
        assert!(headers.contains("x-TRACE"));
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["X-Trace"]);
    }

    #[test]
    fn test_header_without_colon() {
        let headers = headers_from(&["NoColonHere"]);
        assert_eq!(headers.get("NoColonHere").unwrap(), [""]);
    }

    #[test]
    fn test_headers_with_multiple_colons() {
        let headers = headers_from(&["X-Test: value:with:colons"]);
        assert_eq!(headers.get("X-Test").unwrap(), ["value:with:colons"]);
    }

    #[test]
    fn test_header_values_are_trimmed() {
        let headers = headers_from(&["  Connection :   keep-alive ,  Close  "]);
        assert_eq!(headers.get("connection").unwrap(), ["keep-alive", "Close"]);
        assert!(headers.has_token("Connection", "close"));
        assert!(!headers.has_token("Connection", "upgrade"));
        assert!(!headers.has_token("Missing", "close"));
    }

    #[test]
    fn test_header_order_is_preserved() {
        let headers = headers_from(&["B: 1", "A: 2", "C: 3", "a: 4"]);
        let collected: Vec<(&str, Vec<String>)> = headers.iter().map(|(k, v)| (k, v.to_vec())).collect();
        assert_eq!(
            collected,
            vec![
                ("B", vec!["1".to_string()]),
                ("A", vec!["2".to_string(), "4".to_string()]),
                ("C", vec!["3".to_string()]),
            ]
        );
    }
}
