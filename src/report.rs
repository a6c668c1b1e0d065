use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::Settings;
use crate::model::{Device, Failure, FinalResult, ReportRecord, Site};
use crate::pagespeed;

// Runs both audits for every site, mobile before desktop, one request at a
// time. Reachability failures are collected and the run continues; a
// malformed successful response aborts the run instead, a substituted value
// there would quietly corrupt the report. Reports come out in input order.
pub async fn collect_reports(
    client: &Client,
    settings: &Settings,
    sites: &[Site],
) -> Result<FinalResult> {
    let total = sites.len();
    let mut failures = Vec::new();
    let mut reports = Vec::with_capacity(total);

    for (index, site) in sites.iter().enumerate() {
        let mut record = ReportRecord::from_site(site);

        for device in Device::ALL {
            let request_url =
                pagespeed::audit_url(&settings.endpoint, &site.url, device, &settings.api_key);
            match pagespeed::fetch_audit(client, request_url).await {
                Some(body) => {
                    let scores = pagespeed::extract_scores(body).with_context(|| {
                        format!("audit of {} ({}) returned an unexpected response", site.url, device)
                    })?;
                    record.set_scores(device, scores);
                }
                None => failures.push(Failure {
                    url: site.url.clone(),
                    device,
                }),
            }
        }

        reports.push(record);
        log::info!("report {} of {} done: {}", index + 1, total, site.url);
    }

    Ok(FinalResult { failures, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::OutputFormat;
    use crate::model::ScoreSet;
    use reqwest::Url;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    // Serves one canned HTTP response per incoming connection, in order, and
    // hands back the raw requests it saw. Audits are strictly sequential, so
    // connection order is request order.
    fn spawn_stub(responses: Vec<String>) -> (Url, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = Url::parse(&format!("http://{}/runPagespeed", listener.local_addr().unwrap())).unwrap();

        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|response| {
                    let (mut stream, _) = listener.accept().unwrap();
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    loop {
                        let n = stream.read(&mut buf).unwrap();
                        request.extend_from_slice(&buf[..n]);
                        if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    stream.write_all(response.as_bytes()).unwrap();
                    String::from_utf8_lossy(&request).to_string()
                })
                .collect()
        });

        (endpoint, handle)
    }

    fn ok_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    fn error_response() -> String {
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string()
    }

    fn settings_for(endpoint: Url) -> Settings {
        Settings {
            api_key: "test-key".to_string(),
            endpoint,
            sites_file: "sites.txt".into(),
            delimiter: '\t',
            format: OutputFormat::Json,
            output_file: "lighthouse.json".into(),
        }
    }

    // Points the client at a closed local port so every audit fails fast
    fn unreachable_settings() -> Settings {
        settings_for(Url::parse("http://127.0.0.1:9/runPagespeed").unwrap())
    }

    fn site(route: &str, screen: &str, url: &str) -> Site {
        Site {
            route: route.to_string(),
            screen: screen.to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn unreachable_audits_become_failures_not_missing_reports() {
        let sites = vec![
            site("Home", "Landing", "https://example.com"),
            site("Home", "Checkout", "https://example.com/checkout"),
        ];

        let client = Client::new();
        let result = collect_reports(&client, &unreachable_settings(), &sites)
            .await
            .unwrap();

        // one record per page even though every audit failed
        assert_eq!(result.reports.len(), 2);
        assert_eq!(result.failures.len(), 4);

        // failures keep input order, mobile attempted before desktop
        assert_eq!(result.failures[0].url, "https://example.com");
        assert_eq!(result.failures[0].device, Device::Mobile);
        assert_eq!(result.failures[1].device, Device::Desktop);
        assert_eq!(result.failures[2].url, "https://example.com/checkout");

        // scores stay at the empty marker, never zero
        assert_eq!(result.reports[0].mobile, ScoreSet::default());
        assert_eq!(result.reports[0].desktop, ScoreSet::default());
        assert_eq!(result.reports[0].route, "Home");
        assert_eq!(result.reports[1].screen, "Checkout");
    }

    #[tokio::test]
    async fn mobile_success_and_desktop_failure_merge_onto_one_record() {
        let body = r#"{
            "loadingExperience": { "initial_url": "https://example.com" },
            "lighthouseResult": {
                "finalUrl": "https://example.com/",
                "configSettings": { "emulatedFormFactor": "mobile" },
                "categories": {
                    "performance": { "score": 0.42 },
                    "accessibility": { "score": 0.95 },
                    "best-practices": { "score": 100 },
                    "seo": { "score": 0.81 }
                }
            }
        }"#;
        let (endpoint, stub) = spawn_stub(vec![ok_response(body), error_response()]);

        let sites = vec![site("Home", "Landing", "https://example.com")];
        let client = Client::new();
        let result = collect_reports(&client, &settings_for(endpoint), &sites)
            .await
            .unwrap();

        assert_eq!(result.reports.len(), 1);
        let record = &result.reports[0];
        assert_eq!(record.mobile.performance, Some(0.42));
        assert_eq!(record.mobile.accessibility, Some(0.95));
        assert_eq!(record.mobile.best_practices, Some(100.0));
        assert_eq!(record.mobile.seo, Some(0.81));
        assert_eq!(record.desktop, ScoreSet::default());

        assert_eq!(
            result.failures,
            vec![Failure {
                url: "https://example.com".to_string(),
                device: Device::Desktop,
            }]
        );

        // mobile went over the wire before desktop
        let requests = stub.join().unwrap();
        assert!(requests[0].contains("strategy=mobile"));
        assert!(requests[1].contains("strategy=desktop"));
    }

    #[tokio::test]
    async fn malformed_successful_response_aborts_the_run() {
        let (endpoint, stub) = spawn_stub(vec![ok_response(r#"{"unexpected": true}"#)]);

        let sites = vec![site("Home", "Landing", "https://example.com")];
        let client = Client::new();
        let err = collect_reports(&client, &settings_for(endpoint), &sites)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("https://example.com"));
        assert!(err.to_string().contains("MOBILE"));
        drop(stub);
    }

    #[tokio::test]
    async fn reports_keep_input_order() {
        let sites = vec![
            site("B", "2", "https://example.com/b"),
            site("A", "1", "https://example.com/a"),
            site("B", "3", "https://example.com/c"),
        ];

        let client = Client::new();
        let result = collect_reports(&client, &unreachable_settings(), &sites)
            .await
            .unwrap();

        let urls: Vec<&str> = result.reports.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://example.com/b",
                "https://example.com/a",
                "https://example.com/c"
            ]
        );
    }
}
