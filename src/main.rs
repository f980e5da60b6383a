use std::error::Error;

use incr_font::decompress_base_font;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(infile), Some(outfile)) = (args.next(), args.next()) else {
        eprintln!("usage: incr-font <transfer-file> <out-file> [bundle-file...]");
        std::process::exit(2);
    };

    println!("Reading from {infile}");
    let transfer = std::fs::read(&infile)?;
    let mut font = decompress_base_font(&transfer)?;

    for bundle_file in args {
        println!("Injecting {bundle_file}");
        font.inject(&std::fs::read(&bundle_file)?)?;
    }

    println!("Writing to {outfile}");
    std::fs::write(outfile, font.into_bytes())?;
    Ok(())
}
