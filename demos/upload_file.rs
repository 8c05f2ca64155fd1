use std::io::Read;
use std::sync::Arc;

// Import stream_upload types.
use stream_upload::{DebugOptions, LogObserver, UploadBody};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The file to upload, e.g. `cargo run --example upload_file -- Cargo.toml`.
    let path = std::env::args().nth(1).unwrap_or_else(|| "Cargo.toml".to_owned());

    // Build the body with an extra form field and a fixed boundary so the output is reproducible.
    let body = UploadBody::builder("file", &path)
        .field("uploader", "demo")
        .trace_id("demo-1")
        .debug_options(DebugOptions::new().fixed_boundary("X-DEMO-BOUNDARY"))
        .observer(Arc::new(LogObserver))
        .open()?;

    // Wrap it in a `POST` request, any HTTP client taking an `http::Request` can send it.
    let mut req = stream_upload::upload_request("http://localhost:3000/upload", body)?;

    println!("{} {}", req.method(), req.uri());
    for (name, value) in req.headers() {
        println!("{}: {}", name, value.to_str()?);
    }

    // Pull the body the way a transport would, in fixed size chunks.
    let mut chunk = [0u8; 4096];
    let mut total = 0;
    loop {
        let n = req.body_mut().read(&mut chunk)?;
        if n == 0 {
            break;
        }
        total += n;
    }

    println!("\nstreamed {} bytes", total);

    Ok(())
}
