use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "medconsole")]
#[command(about = "Medconsole: manage hospitals and their DICOM files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides config and MEDCONSOLE_URL env var)
    #[arg(short, long, global = true, env = "MEDCONSOLE_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "MEDCONSOLE_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log requests and session changes to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Manage hospitals
    Hospital(HospitalArgs),
    /// View, upload and export hospital DICOM files
    Dicom(DicomArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Username
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password
    #[arg(long, env = "MEDCONSOLE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: String,
    /// Username
    #[arg(short, long)]
    pub username: String,
    /// Password
    #[arg(long)]
    pub password: String,
    /// Password again
    #[arg(long)]
    pub confirm_password: String,
}

#[derive(clap::Args)]
pub struct HospitalArgs {
    #[command(subcommand)]
    pub command: HospitalCommands,
}

#[derive(Subcommand)]
pub enum HospitalCommands {
    /// List hospitals, optionally searching by name or code
    List(ListArgs),
    /// Register a new hospital
    Create(HospitalFormArgs),
    /// Edit a hospital; omitted fields keep their current value
    Update(UpdateArgs),
    /// Delete a hospital
    Delete(DeleteArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum SearchBy {
    #[default]
    Name,
    Code,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Search term
    pub term: Option<String>,
    /// Field the term is matched against
    #[arg(long, default_value = "name")]
    pub by: SearchBy,
}

#[derive(clap::Args, Default)]
pub struct HospitalFormArgs {
    /// Hospital name
    #[arg(long)]
    pub name: Option<String>,
    /// Hospital address
    #[arg(long)]
    pub address: Option<String>,
    /// Primary contact name
    #[arg(long)]
    pub first_contact_name: Option<String>,
    /// Primary contact email
    #[arg(long)]
    pub first_contact_email: Option<String>,
    /// Primary contact phone number
    #[arg(long)]
    pub first_contact_number: Option<String>,
    /// Secondary contact name
    #[arg(long)]
    pub second_contact_name: Option<String>,
    /// Secondary contact email
    #[arg(long)]
    pub second_contact_email: Option<String>,
    /// Secondary contact phone number
    #[arg(long)]
    pub second_contact_number: Option<String>,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    /// Hospital id
    pub id: String,
    #[command(flatten)]
    pub form: HospitalFormArgs,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Hospital id
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(clap::Args)]
pub struct DicomArgs {
    #[command(subcommand)]
    pub command: DicomCommands,
}

#[derive(Subcommand)]
pub enum DicomCommands {
    /// Show the stored file's patient details and header
    Show {
        /// Hospital id
        id: String,
    },
    /// Upload a .dcm file for a hospital
    Upload {
        /// Hospital id
        id: String,
        /// Path to the .dcm file
        file: PathBuf,
    },
    /// Save the stored file to disk
    Export {
        /// Hospital id
        id: String,
        /// Output path (default: <hospital code or id>.dcm)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}
