//! Header inspection.

use super::event::{Direction, HeaderPair};

/// Title line logged ahead of the pairs.
pub fn header_title(direction: Direction) -> &'static str {
    match direction {
        Direction::Request => "Request Headers:",
        Direction::Response => "Response Headers:",
    }
}

/// One `\tkey: value` line per pair, in wire order.
pub fn header_lines(headers: &[HeaderPair]) -> Vec<String> {
    headers
        .iter()
        .map(|header| format!("\t{}: {}", header.key, header.value))
        .collect()
}

/// Log every header pair of a header event in wire order.
pub fn inspect_headers(direction: Direction, headers: &[HeaderPair]) {
    tracing::info!(direction = %direction, count = headers.len(), "{}", header_title(direction));

    for line in header_lines(headers) {
        tracing::info!(direction = %direction, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_name_the_direction() {
        assert_eq!(header_title(Direction::Request), "Request Headers:");
        assert_eq!(header_title(Direction::Response), "Response Headers:");
    }

    #[test]
    fn lines_keep_wire_order_and_duplicates() {
        let headers = [
            HeaderPair::new(":path", "/"),
            HeaderPair::new("set-cookie", "a=1"),
            HeaderPair::new("content-type", "application/json"),
            HeaderPair::new("set-cookie", "b=2"),
        ];

        assert_eq!(
            header_lines(&headers),
            vec![
                "\t:path: /",
                "\tset-cookie: a=1",
                "\tcontent-type: application/json",
                "\tset-cookie: b=2",
            ]
        );
    }

    #[test]
    fn empty_header_map_has_no_lines() {
        assert!(header_lines(&[]).is_empty());
        inspect_headers(Direction::Request, &[]);
    }
}
