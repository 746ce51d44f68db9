use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "apkcat")]
#[command(version)]
#[command(about = "Index and inspect APK/ZIP containers", long_about = None)]
#[command(after_help = "Examples:\n  \
  apkcat -v app.apk                        verbose entry listing\n  \
  apkcat --sig app.apk                     summarize the signing block\n  \
  apkcat --tree https://example.com/a.apk  path tree of a remote package\n  \
  apkcat -p AndroidManifest.xml app.apk    dump one entry to stdout\n  \
  apkcat -l app.z01 app.z02 app.zip        list a split container")]
pub struct Cli {
    /// Container path or HTTP URL; several paths are the ordered parts
    /// of a split container
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    pub files: Vec<String>,

    /// List entry names (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List entries verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print the path tree of the file entries
    #[arg(long)]
    pub tree: bool,

    /// Summarize the signing block
    #[arg(long)]
    pub sig: bool,

    /// Write the named entries' payloads to stdout
    #[arg(short = 'p', value_name = "NAME", num_args = 1..)]
    pub print: Vec<String>,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.files.len() == 1
            && (self.files[0].starts_with("http://") || self.files[0].starts_with("https://"))
    }

    pub fn is_split(&self) -> bool {
        self.files.len() > 1
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || !self.print.is_empty()
    }
}
