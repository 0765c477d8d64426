use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use gridlock_report::{Reporter, ReporterConfig};
use tiny_http::{Response, Server};

#[test]
fn observations_reach_the_gateway_in_order() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (sender, receiver) = mpsc::channel();
    let gateway = thread::spawn(move || {
        for _ in 0..2 {
            let mut request = server.recv().unwrap();
            let url = request.url().to_string();
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            sender.send((url, body)).unwrap();
            request.respond(Response::empty(200)).unwrap();
        }
    });

    let config = ReporterConfig::new(format!("http://{addr}"), "pod-1234");
    let reporter = Reporter::spawn(config).unwrap();
    reporter.metric("loss", 0.31);
    reporter.parameter("optimizer", "adam");
    reporter.shutdown();
    gateway.join().unwrap();

    let (url, body) = receiver.recv().unwrap();
    assert_eq!(url, "/metrics/job/reporter_pod_info/podUUID/pod-1234");
    assert!(body.contains("gridlock_push_gateway_metric_loss"));
    assert!(body.contains("push_gateway_type=\"metric\""));

    let (_, body) = receiver.recv().unwrap();
    assert!(body.contains("gridlock_push_gateway_parameter_optimizer"));
    assert!(body.contains("param_value=\"adam\""));
}

#[test]
fn a_full_queue_drops_instead_of_blocking() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        while let Ok(request) = server.recv() {
            // A slow gateway keeps the worker busy so the queue fills.
            thread::sleep(Duration::from_millis(100));
            let _ = request.respond(Response::empty(200));
        }
    });

    let mut config = ReporterConfig::new(format!("http://{addr}"), "pod-1");
    config.queue_capacity = 1;
    let reporter = Reporter::spawn(config).unwrap();
    for epoch in 0..20 {
        reporter.metric("loss", 1.0 / (epoch + 1) as f64);
    }
    assert!(reporter.dropped() > 0);
    reporter.shutdown();
}

#[test]
fn delivery_retries_are_bounded() {
    // Nothing listens on the gateway address; every attempt fails fast and
    // the worker must still give up and drain.
    let mut config = ReporterConfig::new("http://127.0.0.1:1", "pod-1");
    config.retry_limit = 2;
    config.retry_delay = Duration::from_millis(10);
    config.request_timeout = Duration::from_millis(500);
    let reporter = Reporter::spawn(config).unwrap();
    reporter.metric("loss", 0.5);
    let started = Instant::now();
    reporter.shutdown();
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn from_env_requires_both_variables() {
    std::env::remove_var(gridlock_report::GATEWAY_URL_VAR);
    std::env::remove_var(gridlock_report::POD_UUID_VAR);
    let err = ReporterConfig::from_env().unwrap_err();
    assert_eq!(err.info().code, "reporter-env");

    std::env::set_var(gridlock_report::GATEWAY_URL_VAR, "http://gateway:9091");
    std::env::set_var(gridlock_report::POD_UUID_VAR, "pod-42");
    let config = ReporterConfig::from_env().unwrap();
    assert_eq!(config.gateway_url, "http://gateway:9091");
    assert_eq!(config.grouping_value, "pod-42");
}
