use std::env;
use std::process;

use resdata_reader::{Endian, Grid, KeywordCache, RecordStream};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <path-to-grid-file> [--formatted] [--little-endian] [--sort-offset]",
            args[0]
        );
        process::exit(1);
    }

    let path = &args[1];
    let formatted = args.iter().any(|a| a == "--formatted");
    let endian = if args.iter().any(|a| a == "--little-endian") {
        Endian::Little
    } else {
        Endian::Big
    };
    let sort_offset = args.iter().any(|a| a == "--sort-offset");

    println!("Reading reservoir data file: {}", path);
    println!("{}", "=".repeat(60));

    let open = if formatted {
        RecordStream::open_formatted_reader(path)
    } else {
        RecordStream::open_reader(path, endian)
    };
    let mut stream = match open {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("ERROR: cannot open {}: {}", path, e);
            process::exit(1);
        }
    };

    let cache = match KeywordCache::scan(&mut stream) {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("ERROR: keyword scan failed: {}", e);
            process::exit(1);
        }
    };

    println!("\nKeywords ({}):", cache.len());
    println!("  {:<8} {:<4} {:>10} {:>10}", "NAME", "TYPE", "COUNT", "OFFSET");
    let entries: Vec<_> = if sort_offset {
        cache.iter_sorted_by_offset()
    } else {
        cache.iter().collect()
    };
    for entry in entries {
        println!(
            "  {:<8} {:<4} {:>10} {:>10}",
            entry.header.name,
            entry.header.kw_type.tag(),
            entry.header.count,
            entry.offset
        );
    }

    if let Err(e) = stream.rewind() {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
    match Grid::from_stream(&mut stream) {
        Ok(grid) => {
            let dims = grid.dims();
            println!("\nGrid:");
            println!("  Dimensions: {} x {} x {}", dims.nx, dims.ny, dims.nz);
            println!("  Global cells: {}", dims.global_size());
            println!("  Active cells: {}", grid.nactive());
            let lgr_names: Vec<&str> = grid
                .main_grid()
                .descendants()
                .into_iter()
                .skip(1)
                .map(|node| node.name())
                .collect();
            println!("  LGRs: {}", lgr_names.len());
            for name in lgr_names {
                println!("    {}", name);
            }
            println!("  NNC connections: {}", grid.total_nnc_count());
        }
        Err(e) => {
            eprintln!("\nERROR: grid load failed");
            eprintln!("  {}", e);
            process::exit(1);
        }
    }
}
