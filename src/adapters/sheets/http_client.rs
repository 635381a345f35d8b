use google_sheets4::{hyper, hyper_rustls};

pub type HttpsConnector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;
pub type HttpClient = hyper::Client<HttpsConnector>;

pub fn http_client() -> HttpClient {
    hyper::Client::builder().build(
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .unwrap()
            .https_or_http()
            .enable_http1()
            .build(),
    )
}
