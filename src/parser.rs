//! Loader for `.http` collection files.
//!
//! ```text
//! # comment
//! ### group: auth
//! ### name: login, status: 201, timeout: 5
//! POST http://localhost:8080/login HTTP/1.1
//! Content-Type: application/json
//!
//! {"user": "admin"}
//! ### end
//! ### name: health
//! GET http://localhost:8080/health
//! ```

use core::iter::Peekable;
use std::fs::read_to_string;
use std::iter::Enumerate;
use std::path::Path;
use std::str::Lines;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode, Version};
use url::Url;

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::test_request::TestRequest;
use crate::transport::{Body, RequestOptions, Transport};

type Source<'a> = Peekable<Enumerate<Lines<'a>>>;

pub fn parse_http_file<C: 'static>(
    path: impl AsRef<Path>,
    transport: Arc<dyn Transport>,
) -> Result<Collection<C>> {
    let path = path.as_ref();
    if path.extension().and_then(|ext| ext.to_str()) != Some("http") {
        return Err(Error::NotHttpFile(path.to_path_buf()));
    }

    let content = read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    parse_http_str(name, &content, transport)
}

pub fn parse_http_str<C: 'static>(
    name: impl Into<String>,
    content: &str,
    transport: Arc<dyn Transport>,
) -> Result<Collection<C>> {
    let mut lines = content.lines().enumerate().peekable();

    let mut groups = Groups {
        root: Collection::new(name, Vec::new()),
        open: Vec::new(),
    };

    while let Some((index, line)) = lines.next() {
        let number = index + 1;
        let line = line.trim();

        if line.is_empty() || (line.starts_with('#') && !line.starts_with("###")) {
            continue;
        }
        if !line.starts_with("###") {
            return Err(Error::parse(number, "unexpected character expected '###'"));
        }

        let header = line[3..].trim();
        if header == "end" {
            groups.close(number)?;
            continue;
        }

        let comment = parse_comment(header, number)?;
        if let Some((_, group)) = comment.iter().find(|(key, _)| key == "group") {
            if comment.len() > 1 {
                return Err(Error::parse(number, "a group header takes no other keys"));
            }
            groups.open.push((number, Collection::new(group.clone(), Vec::new())));
            continue;
        }

        let request = parse_http(&mut lines, &comment, number, transport.clone())?;
        groups.current().push(request);
    }

    groups.finish()
}

struct Groups<C> {
    root: Collection<C>,
    open: Vec<(usize, Collection<C>)>,
}

impl<C: 'static> Groups<C> {
    fn current(&mut self) -> &mut Collection<C> {
        match self.open.last_mut() {
            Some((_, group)) => group,
            None => &mut self.root,
        }
    }

    fn close(&mut self, line: usize) -> Result<()> {
        let (_, group) = self
            .open
            .pop()
            .ok_or_else(|| Error::parse(line, "`end` without an open group"))?;
        self.current().push(group);
        Ok(())
    }

    fn finish(self) -> Result<Collection<C>> {
        if let Some((line, group)) = self.open.last() {
            return Err(Error::parse(
                *line,
                format!("group `{}` is never closed", group.name()),
            ));
        }
        Ok(self.root)
    }
}

fn parse_http(
    lines: &mut Source<'_>,
    comment: &[(String, String)],
    number: usize,
    transport: Arc<dyn Transport>,
) -> Result<TestRequest> {
    let (index, line) = match lines.next() {
        Some((index, line)) if !line.trim().is_empty() && !line.trim().starts_with('#') => {
            (index, line.trim())
        }
        _ => return Err(Error::parse(number + 1, "expected a request line")),
    };
    let (method, url, version) = parse_req(line, index + 1)?;

    let headers = parse_headers(lines)?;
    let body = parse_body(lines);

    let mut request_options = RequestOptions {
        headers,
        body: body.map(Body::Text),
        version,
        ..Default::default()
    };

    let mut expected_status = StatusCode::OK;
    let mut name = format!("{} {}", method, url);

    for (key, value) in comment {
        match key.as_str() {
            "name" => name = value.clone(),
            "status" => {
                expected_status = value
                    .parse::<u16>()
                    .ok()
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .ok_or_else(|| Error::parse(number, format!("invalid status `{value}`")))?;
            }
            "timeout" => {
                let seconds = value
                    .parse::<u64>()
                    .map_err(|_| Error::parse(number, format!("invalid timeout `{value}`")))?;
                request_options.timeout = Some(Duration::from_secs(seconds));
            }
            _ => return Err(Error::parse(number, format!("unknown key `{key}`"))),
        }
    }

    Ok(TestRequest::new(name, method, url, transport)
        .expect_status(expected_status)
        .with_options(request_options))
}

fn parse_body(lines: &mut Source<'_>) -> Option<String> {
    let mut body: Vec<&str> = Vec::new();

    while let Some(&(_, line)) = lines.peek() {
        if line.trim_start().starts_with('#') {
            break;
        }
        body.push(line);
        lines.next();
    }

    let body = body.join("\n");
    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

fn parse_headers(lines: &mut Source<'_>) -> Result<Vec<(String, String)>> {
    let mut headers = Vec::new();

    while let Some(&(index, line)) = lines.peek() {
        let line = line.trim();
        if line.starts_with('#') {
            break;
        }
        let number = index + 1;
        lines.next();
        if line.is_empty() {
            break;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::parse(number, "expected a `Name: value` header"))?;

        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(headers)
}

fn parse_req(req: &str, number: usize) -> Result<(Method, Url, Option<Version>)> {
    let req = req.split_whitespace().collect::<Vec<&str>>();

    if req.len() < 2 || req.len() > 3 {
        return Err(Error::parse(number, "expected `METHOD URL [VERSION]`"));
    }

    let method = Method::from_bytes(req[0].to_uppercase().as_bytes())
        .map_err(|_| Error::parse(number, format!("invalid method `{}`", req[0])))?;
    let url = Url::parse(req[1])
        .map_err(|err| Error::parse(number, format!("invalid url `{}`: {err}", req[1])))?;

    let version = match req.get(2) {
        None => None,
        Some(&"HTTP/1.1") => Some(Version::HTTP_11),
        Some(&"HTTP/1.0") => Some(Version::HTTP_10),
        Some(other) => {
            return Err(Error::parse(number, format!("unsupported version `{other}`")));
        }
    };

    Ok((method, url, version))
}

fn parse_comment(comment: &str, number: usize) -> Result<Vec<(String, String)>> {
    let mut result: Vec<(String, String)> = Vec::new();

    for pair in comment.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| Error::parse(number, format!("expected `key: value`, got `{pair}`")))?;

        let key = key.trim();
        if result.iter().any(|(k, _)| k == key) {
            return Err(Error::parse(number, format!("duplicate key `{key}`")));
        }
        result.push((key.to_string(), value.trim().to_string()));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Response;
    use std::cell::RefCell;

    /// Answers 201 to POST and 200 to everything else, recording each call.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(Method, String, RequestOptions)>>,
    }

    impl Transport for Recorder {
        fn request(&self, method: &Method, url: &Url, options: &RequestOptions) -> Result<Response> {
            self.calls
                .borrow_mut()
                .push((method.clone(), options.target(url).to_string(), options.clone()));
            let status = if *method == Method::POST {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            Ok(Response::with_status(status))
        }
    }

    fn parse(content: &str) -> Result<Collection<()>> {
        parse_http_str("suite", content, Arc::new(Recorder::default()))
    }

    const SUITE: &str = "\
# smoke suite
### name: health
GET http://localhost:8080/health

### group: auth
### name: login, status: 201, timeout: 5
post http://localhost:8080/login HTTP/1.1
Content-Type: application/json
Accept: application/json

{
  \"user\": \"admin\"
}
### group: profile
### name: me
GET http://localhost:8080/me?verbose=1
### end
### end
###
DELETE http://localhost:8080/session
";

    #[test]
    fn test_parse_nested_groups() {
        let root = parse(SUITE).unwrap();

        assert_eq!(root.name(), "suite");
        let names = root
            .children()
            .iter()
            .map(|child| child.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["health", "auth", "DELETE http://localhost:8080/session"]
        );

        let auth = root.children()[1].as_collection().unwrap();
        assert_eq!(auth.len(), 2);
        assert_eq!(auth.children()[0].name(), "login");

        let profile = auth.children()[1].as_collection().unwrap();
        assert_eq!(profile.children()[0].name(), "me");
        assert!(profile.children()[0].as_collection().is_none());
    }

    #[test]
    fn test_parsed_requests_reach_transport() {
        let recorder = Arc::new(Recorder::default());
        let mut root: Collection<()> = parse_http_str("suite", SUITE, recorder.clone()).unwrap();

        root.execute(&mut ()).unwrap();
        assert!(root.success().is_success());

        let calls = recorder.calls.borrow();
        let targets = calls
            .iter()
            .map(|(method, url, _)| format!("{method} {url}"))
            .collect::<Vec<_>>();
        assert_eq!(
            targets,
            vec![
                "GET http://localhost:8080/health",
                "POST http://localhost:8080/login",
                "GET http://localhost:8080/me?verbose=1",
                "DELETE http://localhost:8080/session",
            ]
        );

        let login = &calls[1].2;
        assert_eq!(login.timeout, Some(Duration::from_secs(5)));
        assert_eq!(login.version, Some(Version::HTTP_11));
        assert_eq!(
            login.headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
        assert_eq!(
            login.body,
            Some(Body::Text("{\n  \"user\": \"admin\"\n}".to_string()))
        );

        let health = &calls[0].2;
        assert_eq!(health, &RequestOptions::default());
    }

    #[test]
    fn test_expected_status_defaults_to_ok() {
        let mut root = parse("### name: create\nPOST http://localhost:8080/items\n").unwrap();

        root.execute(&mut ()).unwrap();

        // the recorder answers 201, the request expects 200
        assert!(root.success().is_failure());
    }

    #[test]
    fn test_parse_errors_report_line() {
        let cases = [
            ("GET http://localhost/\n", 1),
            ("### name: a, color: red\nGET http://localhost/\n", 1),
            ("### status: abc\nGET http://localhost/\n", 1),
            ("### name: a\n\n", 2),
            ("### name: a\nGET\n", 2),
            ("### name: a\nGET http://localhost/ HTTP/9\n", 2),
            ("### name: a\nGET http://localhost/\nnot a header\n", 3),
            ("### name: a, name: b\nGET http://localhost/\n", 1),
            ("### group: g, group: h\n", 1),
            ("### end\n", 1),
            ("### name: a\nGET http://localhost/\n### group: g\n", 3),
        ];

        for (content, expected_line) in cases {
            match parse(content) {
                Err(Error::Parse { line, .. }) => assert_eq!(line, expected_line, "{content:?}"),
                Err(other) => panic!("unexpected error for {content:?}: {other}"),
                Ok(_) => panic!("expected an error for {content:?}"),
            }
        }
    }

    #[test]
    fn test_parse_http_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke.http");
        std::fs::write(&path, SUITE).unwrap();

        let root: Collection<()> = parse_http_file(&path, Arc::new(Recorder::default())).unwrap();
        assert_eq!(root.name(), "smoke");
        assert_eq!(root.len(), 3);

        let wrong = dir.path().join("smoke.txt");
        std::fs::write(&wrong, SUITE).unwrap();
        assert!(matches!(
            parse_http_file::<()>(&wrong, Arc::new(Recorder::default())),
            Err(Error::NotHttpFile(_))
        ));
    }
}
