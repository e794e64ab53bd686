use shadow_rs::SdResult;
use std::fs::File;
use std::io::Write;
use std::process::Command;

fn main() -> SdResult<()> {
    shadow_rs::new_hook(hook)
}

fn hook(file: &File) -> SdResult<()> {
    append_write_const(file)?;
    Ok(())
}

fn git_rev_parse(args: &[&str]) -> String {
    Command::new("git")
        .arg("rev-parse")
        .args(args)
        .output()
        .ok()
        .and_then(|x| String::from_utf8(x.stdout).ok())
        .map(|x| x.trim().to_string())
        .unwrap_or_default()
}

fn append_write_const(mut file: &File) -> SdResult<()> {
    let hash = git_rev_parse(&["HEAD"]);
    let short_hash = git_rev_parse(&["--short", "HEAD"]);

    writeln!(file, "pub const RD_COMMIT_HASH: &str = \"{hash}\";")?;
    writeln!(file, "pub const RD_COMMIT_HASH_SHORT: &str = \"{short_hash}\";")?;
    Ok(())
}
