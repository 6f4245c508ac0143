use std::path::PathBuf;

use clap_mangen::Man;

use clap_complete::{
  Shell::{Bash, Elvish, Fish, PowerShell, Zsh},
  generate_to,
};

fn main() -> std::io::Result<()> {
  build_manpages()?;
  build_completions()?;
  Ok(())
}

fn build_completions() -> std::io::Result<()> {
  let outdir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("completions");
  std::fs::create_dir_all(&outdir)?;
  let mut cmd = pixelfix_lib::app::create_app().name("pixelfix");
  // Generate shell completions.
  for shell in [Bash, Elvish, Fish, PowerShell, Zsh] {
    generate_to(shell, &mut cmd, "pixelfix", &outdir).expect("completions build failed");
  }
  Ok(())
}

fn build_manpages() -> std::io::Result<()> {
  let outdir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("manpages");
  std::fs::create_dir_all(&outdir)?;
  let cmd = pixelfix_lib::app::create_app().name("pixelfix");
  let man = Man::new(cmd);
  let mut buffer: Vec<u8> = Default::default();
  man.render(&mut buffer)?;

  std::fs::write(outdir.join("pixelfix.1"), buffer)?;
  Ok(())
}
