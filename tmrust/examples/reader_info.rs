//! Connect to a reader and print its identity and configuration

use tmrust::{Param, ParamValue, Reader};

fn main() -> tmrust::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Change to your reader URI, e.g. tmr://192.168.1.50
    let uri = std::env::var("READER_URI").unwrap_or_else(|_| "test:///dev/info".to_string());

    println!("Connecting to {uri}...");
    let mut reader = Reader::create(&uri)?;
    reader.connect()?;
    println!("✓ Connected!");

    for param in [
        Param::VersionModel,
        Param::VersionHardware,
        Param::VersionSoftware,
        Param::VersionSerial,
        Param::RegionId,
        Param::BaudRate,
        Param::CommandTimeout,
        Param::TransportTimeout,
    ] {
        match reader.get_param(param) {
            Ok(value) => println!("  {param} = {value}"),
            Err(e) => println!("  {param} unavailable: {e}"),
        }
    }

    // Give the transport more slack before a long read
    reader.set_param(Param::TransportTimeout, &ParamValue::Uint32(10_000))?;
    println!("✓ Transport timeout raised to 10 s");

    reader.destroy()?;
    println!("✓ Disconnected");

    Ok(())
}
