//! Tag read example against the in-process simulated reader

use tmrust::{Reader, TransportDirection};
use tmrust_transport::{SimTag, SimTransport};

fn main() -> tmrust::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Simulated reader with two tags in the field; swap in
    // Reader::create("tmr://<ip>") for real hardware
    let transport = SimTransport::new("test:///dev/demo");
    let device = transport.device_handle();
    device.add_tag(SimTag::new(vec![0xE2, 0x00, 0x00, 0x17, 0x22, 0x01]).with_antenna(1));
    device.add_tag(SimTag::new(vec![0xE2, 0x00, 0x00, 0x17, 0x22, 0x02]).with_antenna(2));

    let mut reader = Reader::with_transport("test:///dev/demo", Box::new(transport));

    // Watch the raw frames go by
    reader.add_transport_listener(|direction, data, timeout| {
        println!(
            "  [{direction}] {} bytes (timeout {:?})",
            data.len(),
            timeout
        );
        if direction == TransportDirection::Send {
            println!("  >> {}", hex_dump(data));
        }
    });

    reader.connect()?;
    println!("✓ Connected!");

    let tags = reader.read(500)?;
    println!("✓ Read {} tags:", tags.len());
    for tag in &tags {
        println!("  {}", tag);
    }

    reader.destroy()?;
    println!("✓ Destroyed");

    Ok(())
}

fn hex_dump(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
