//! Status code table and default error pages.

/// Reason phrase for a status code. Unknown codes get an empty phrase.
pub fn reason(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        418 => "I'm a teapot",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "",
    }
}

/// HTML body used for error responses (codes >= 400).
pub fn error_page(code: u16) -> Option<String> {
    if code < 400 {
        return None;
    }
    let message = reason(code);
    Some(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>{code} - Response</title></head>\n\
         <body>\n\
         <h1>{code} {message}</h1>\n\
         </body>\n\
         </html>\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons() {
        assert_eq!(reason(200), "OK");
        assert_eq!(reason(405), "Method Not Allowed");
        assert_eq!(reason(799), "");
    }

    #[test]
    fn error_page_title() {
        let page = error_page(404).unwrap();
        assert!(page.contains("<title>404 - Response</title>"));
        assert!(page.contains("404 Not Found"));
        assert!(error_page(302).is_none());
    }
}
