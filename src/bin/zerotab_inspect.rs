//! zerotab Inspect - Dump struktur root table dari file buffer
//!
//! File di-mmap (zero-copy), lalu ditampilkan:
//! - Posisi root table dan file identifier
//! - Byte width vtable dan table
//! - Offset setiap slot (absent / present)
//!
//! Usage:
//!   cargo run --release --bin zerotab_inspect -- <FILE> [OPTIONS]

use zerotab::core::MappedBuffer;
use zerotab::protocol::{self, Table, FILE_IDENTIFIER_LENGTH, SIZE_UOFFSET};

/// Inspect configuration
struct InspectConfig {
    path: Option<String>,
    size_prefixed: bool,
    ident: Option<[u8; FILE_IDENTIFIER_LENGTH]>,
    slots: Option<u16>,
    hex: bool,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            path: None,
            size_prefixed: false,
            ident: None,
            slots: None,
            hex: false,
        }
    }
}

fn print_help() {
    println!("zerotab Inspect - Dump root table layout\n");
    println!("Usage: zerotab_inspect <FILE> [OPTIONS]\n");
    println!("Options:");
    println!("  -p, --size-prefixed   Buffer diawali size prefix u32");
    println!("  -i, --ident <ID>      Cek file identifier (4 karakter)");
    println!("  -s, --slots <N>       Tampilkan N slot (default: semua slot di vtable)");
    println!("  -x, --hex             Hex dump bytes table");
    println!("  -h, --help            Show this help");
}

fn parse_args() -> Result<InspectConfig, String> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = InspectConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--size-prefixed" | "-p" => {
                config.size_prefixed = true;
            }
            "--ident" | "-i" => {
                let value = args.get(i + 1).ok_or("--ident needs a value")?;
                let bytes: [u8; FILE_IDENTIFIER_LENGTH] = value
                    .as_bytes()
                    .try_into()
                    .map_err(|_| format!("identifier must be {FILE_IDENTIFIER_LENGTH} bytes: {value:?}"))?;
                config.ident = Some(bytes);
                i += 1;
            }
            "--slots" | "-s" => {
                let value = args.get(i + 1).ok_or("--slots needs a value")?;
                config.slots = Some(value.parse().map_err(|_| format!("invalid slot count: {value}"))?);
                i += 1;
            }
            "--hex" | "-x" => {
                config.hex = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {other}"));
            }
            other => {
                config.path = Some(other.to_string());
            }
        }
        i += 1;
    }

    Ok(config)
}

fn hex_dump(bytes: &[u8], base: usize) {
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("   {:08x}  {}", base + row * 16, hex.join(" "));
    }
}

fn describe(table: Table<'_>, config: &InspectConfig) -> zerotab::Result<()> {
    let vtable = table.vtable()?;

    println!("   Root table:    @{}", table.pos());
    println!("   VTable:        @{} ({} bytes)", vtable.pos(), vtable.byte_len());
    println!("   Table size:    {} bytes", vtable.table_len());
    println!("   Slots:         {}", vtable.num_slots());

    let shown = config.slots.unwrap_or(vtable.num_slots() as u16);
    for slot in 0..shown {
        match vtable.slot_offset(slot) {
            0 => println!("     slot {slot:>3}: absent"),
            offset => println!(
                "     slot {slot:>3}: +{offset:<5} (@{})",
                table.pos() + offset as usize
            ),
        }
    }

    if config.hex {
        let len = vtable.table_len() as usize;
        let bytes = zerotab::core::read_bytes(table.buf(), table.pos(), len)?;
        println!("\n   Table bytes:");
        hex_dump(bytes, table.pos());
    }

    Ok(())
}

fn run(config: InspectConfig) -> zerotab::Result<()> {
    let Some(path) = config.path.as_deref() else {
        print_help();
        std::process::exit(2);
    };

    let mapped = MappedBuffer::open(path)?;
    println!("📦 {} ({} bytes)", path, mapped.len());

    let payload = if config.size_prefixed {
        let payload = protocol::size_prefixed_payload(mapped.as_bytes())?;
        println!("   Size prefix:   {} bytes", payload.len());
        payload
    } else {
        mapped.as_bytes()
    };

    if let Some(ident) = &config.ident {
        let found = protocol::buffer_has_identifier(payload, ident);
        let shown = payload
            .get(SIZE_UOFFSET..SIZE_UOFFSET + FILE_IDENTIFIER_LENGTH)
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        println!(
            "   Identifier:    {:?} {}",
            shown,
            if found { "✅" } else { "❌ mismatch" }
        );
    }

    describe(protocol::root(payload)?, &config)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zerotab=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "inspect failed");
        eprintln!("❌ Inspect error: {}", e);
        std::process::exit(1);
    }
}
