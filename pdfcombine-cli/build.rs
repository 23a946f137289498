use clap::CommandFactory;

#[path = "src/cli.rs"]
mod cli;

// Renders the man page from the clap definitions into OUT_DIR.
fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir =
        std::path::PathBuf::from(std::env::var_os("OUT_DIR").ok_or(std::io::ErrorKind::NotFound)?);
    let cmd = cli::Cli::command();

    let man = clap_mangen::Man::new(cmd);
    let mut buffer: Vec<u8> = Default::default();
    man.render(&mut buffer)?;

    let man_path = out_dir.join("pdfcombine.1");

    std::fs::write(&man_path, buffer)?;
    Ok(())
}
