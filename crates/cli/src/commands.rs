//! CLI commands

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use lumifi_core::LumifiConfig;
use lumifi_http::LumifiClient;
use lumifi_http::services::{AccountSetup, LoginFlow, PageRequest, PracticeDirectory, UserPage};
use lumifi_http::types::{
    CreatePatientRequest, CreatePracticeRequest, CreateUserRequest, DEFAULT_PAGE,
    DEFAULT_PAGE_LIMIT, PasswordRequest, PatientSearchRequest, SecurityUpdateRequest,
    UpdatePatientRequest, UpdatePracticeInfoRequest, UpdateUserRequest,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::info;

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "LUMIFI_PASSWORD", hide_env_values = true)]
        password: String,

        /// Practice account id, required when the login has several
        #[arg(long)]
        practice: Option<String>,

        /// Two-factor code, prompted for when needed and not given
        #[arg(long)]
        otp: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Search and manage patients
    Patients {
        #[command(subcommand)]
        command: PatientCommands,
    },

    /// List and manage practice users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// List the practice's doctors
    Doctors {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Practice details and security settings
    Practice {
        #[command(subcommand)]
        command: PracticeCommands,
    },

    /// Password reset and first-time password setup
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },

    /// Print the lookup lists used when creating accounts
    Reference,
}

#[derive(Args, Clone, Copy)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,

    /// Rows per page (5, 10 or 25)
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    limit: u32,
}

impl From<PageArgs> for PageRequest {
    fn from(args: PageArgs) -> Self {
        Self {
            page: args.page,
            limit: args.limit,
        }
    }
}

#[derive(Args)]
pub struct PatientArgs {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// Date of birth, YYYY-MM-DD
    #[arg(long)]
    dob: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, default_value = "")]
    phone: String,
}

impl From<PatientArgs> for CreatePatientRequest {
    fn from(args: PatientArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            dob: args.dob,
            email_id: args.email,
            phone_number: args.phone,
        }
    }
}

#[derive(Args)]
pub struct UserArgs {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(long)]
    email: String,

    #[arg(long, default_value = "")]
    phone: String,

    /// Role name as listed by `lumifi reference`
    #[arg(long, required_unless_present = "doctor", conflicts_with = "doctor")]
    role: Option<String>,

    /// Give the user the practice's Doctor role
    #[arg(long)]
    doctor: bool,

    /// Require two-factor codes at sign-in
    #[arg(long)]
    two_factor: bool,

    #[arg(long, default_value = "")]
    dea: String,

    #[arg(long, default_value = "")]
    license_number: String,

    #[arg(long, default_value = "")]
    state_of_issue: String,
}

impl UserArgs {
    /// Build the request, resolving `--role` against the offered roles
    async fn into_request(self, client: &LumifiClient) -> Result<CreateUserRequest> {
        let roles = client.list_roles().await?;
        let role = if self.doctor {
            AccountSetup::doctor_role(&roles)
        } else {
            let name = self.role.unwrap_or_default();
            roles
                .iter()
                .find(|role| role.role_name.eq_ignore_ascii_case(&name))
        };
        let Some(role) = role else {
            bail!("Unknown role, see `lumifi reference` for the offered roles");
        };

        Ok(CreateUserRequest {
            first_name: self.first_name,
            last_name: self.last_name,
            email_id: self.email,
            has2fa: self.two_factor,
            phone_number: self.phone,
            role_id: role.id.clone(),
            role: role.role_name.clone(),
            dea: self.dea,
            license_number: self.license_number,
            state_of_issue: self.state_of_issue,
        })
    }
}

#[derive(Subcommand)]
pub enum PatientCommands {
    /// Find patients by name or date of birth
    Search {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        dob: Option<String>,
    },

    /// Show one patient
    Show { id: String },

    /// Add a patient
    Create {
        #[command(flatten)]
        patient: PatientArgs,
    },

    /// Replace a patient's details
    Update {
        id: String,

        #[command(flatten)]
        patient: PatientArgs,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users of every role
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one user
    Show { id: String },

    /// Add a user or doctor
    Create {
        #[command(flatten)]
        user: UserArgs,
    },

    /// Replace a user's details
    Update {
        id: String,

        #[command(flatten)]
        user: UserArgs,
    },

    /// Remove a user
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum PracticeCommands {
    /// Show the signed-in practice
    Show,

    /// Edit the signed-in practice's details, keeping unset fields
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address1: Option<String>,

        #[arg(long)]
        address2: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        zip: Option<String>,

        #[arg(long)]
        office_email: Option<String>,

        #[arg(long)]
        office_phone: Option<String>,

        #[arg(long)]
        website: Option<String>,
    },

    /// Change the email and phone used for two-factor codes
    Security {
        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,
    },

    /// Check whether an email can become an account admin
    AdminAvailable { email: String },

    /// Register a new practice from a JSON request file
    Register { file: PathBuf },
}

#[derive(Subcommand)]
pub enum PasswordCommands {
    /// Email a reset link
    Forgot { email: String },

    /// Choose a new password with the emailed credential
    Reset {
        #[arg(long)]
        credential: String,

        #[arg(long, env = "LUMIFI_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Set the first password of an invited user
    Set {
        #[arg(long)]
        credential: String,

        #[arg(long, env = "LUMIFI_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

impl Commands {
    pub async fn execute(self, settings: LumifiConfig) -> Result<()> {
        let client = config::build_client(&settings).await?;

        match self {
            Self::Login {
                email,
                password,
                practice,
                otp,
            } => login(&client, &email, &password, practice, otp).await,
            Self::Logout => {
                LoginFlow::new(client).logout();
                println!("Signed out");
                Ok(())
            }
            Self::Whoami => print_json(&LoginFlow::new(client).fetch_profile().await?),
            Self::Patients { command } => command.execute(client).await,
            Self::Users { command } => command.execute(client).await,
            Self::Doctors { page } => {
                print_users(&PracticeDirectory::new(client).doctors(page.into()).await?)
            }
            Self::Practice { command } => command.execute(client).await,
            Self::Password { command } => command.execute(client).await,
            Self::Reference => print_json(&AccountSetup::new(client).reference_data().await?),
        }
    }
}

async fn login(
    client: &LumifiClient,
    email: &str,
    password: &str,
    practice: Option<String>,
    otp: Option<String>,
) -> Result<()> {
    let flow = LoginFlow::new(client.clone());
    let response = flow.login(email, password).await?;

    let practice_account_id = match (practice, response.practice_account_list.as_slice()) {
        (Some(id), _) => id,
        (None, [only]) => only.id.clone(),
        (None, []) => bail!("This login has no practice accounts"),
        (None, accounts) => {
            for account in accounts {
                println!("{}\t{}", account.id, account.practice_name);
            }
            bail!("Several practices available, choose one with --practice <id>");
        }
    };

    let selection = flow.select_practice(&practice_account_id).await?;
    if selection.otp_required {
        let code = match otp {
            Some(code) => code,
            None => prompt("Verification code: ")?,
        };
        let verified = flow.verify_otp(&code).await?;
        if !verified.is_success() {
            bail!("Verification failed: {}", verified.message);
        }
    }

    let completion = flow.complete().await?;
    if !client.session().snapshot().is_authenticated() {
        bail!("Sign-in was not completed: {}", completion.message);
    }
    info!(%practice_account_id, "Session stored");
    println!("Signed in to practice {practice_account_id}");
    Ok(())
}

impl PatientCommands {
    async fn execute(self, client: LumifiClient) -> Result<()> {
        let directory = PracticeDirectory::new(client.clone());
        match self {
            Self::Search {
                first_name,
                last_name,
                dob,
            } => {
                let search = PatientSearchRequest {
                    first_name,
                    last_name,
                    dob,
                };
                print_json(&directory.search_patients(&search).await?)
            }
            Self::Show { id } => print_json(&client.get_patient(&id).await?),
            Self::Create { patient } => {
                print_json(&directory.create_patient(&patient.into()).await?)
            }
            Self::Update { id, patient } => {
                let update = UpdatePatientRequest {
                    id,
                    patient: patient.into(),
                };
                print_json(&directory.update_patient(&update).await?)
            }
        }
    }
}

impl UserCommands {
    async fn execute(self, client: LumifiClient) -> Result<()> {
        match self {
            Self::List { page } => {
                print_users(&PracticeDirectory::new(client).users(page.into()).await?)
            }
            Self::Show { id } => print_json(&client.get_user(&id).await?),
            Self::Create { user } => {
                let request = user.into_request(&client).await?;
                print_json(&PracticeDirectory::new(client).create_user(&request).await?)
            }
            Self::Update { id, user } => {
                let request = UpdateUserRequest {
                    id,
                    user: user.into_request(&client).await?,
                };
                print_json(&PracticeDirectory::new(client).update_user(&request).await?)
            }
            Self::Delete { id } => print_json(&client.delete_user(&id).await?),
        }
    }
}

impl PracticeCommands {
    async fn execute(self, client: LumifiClient) -> Result<()> {
        match self {
            Self::Show => print_json(&client.get_practice(&signed_in_practice(&client)?).await?),
            Self::Update {
                name,
                address1,
                address2,
                city,
                state,
                zip,
                office_email,
                office_phone,
                website,
            } => {
                let current = client.get_practice(&signed_in_practice(&client)?).await?;
                let mut edit = UpdatePracticeInfoRequest::from(current);
                let overrides = [
                    (&mut edit.practice_name, name),
                    (&mut edit.address1, address1),
                    (&mut edit.address2, address2),
                    (&mut edit.city, city),
                    (&mut edit.state, state),
                    (&mut edit.zip, zip),
                    (&mut edit.office_email, office_email),
                    (&mut edit.office_phone, office_phone),
                    (&mut edit.website_address, website),
                ];
                for (field, value) in overrides {
                    if let Some(value) = value {
                        *field = value;
                    }
                }
                print_json(&PracticeDirectory::new(client).update_practice(&edit).await?)
            }
            Self::Security { email, phone } => {
                let request = SecurityUpdateRequest {
                    email_id: email,
                    phone_number: phone,
                };
                print_json(&client.update_security(&request).await?)
            }
            Self::AdminAvailable { email } => {
                let available = AccountSetup::new(client)
                    .check_admin_availability(&email)
                    .await?;
                println!("{}", if available { "available" } else { "taken" });
                Ok(())
            }
            Self::Register { file } => {
                let content = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let request: CreatePracticeRequest = serde_json::from_str(&content)
                    .with_context(|| format!("Invalid practice request in {}", file.display()))?;
                print_json(&AccountSetup::new(client).register(&request).await?)
            }
        }
    }
}

impl PasswordCommands {
    async fn execute(self, client: LumifiClient) -> Result<()> {
        let response = match self {
            Self::Forgot { email } => client.forgot_password(&email).await?,
            Self::Reset {
                credential,
                password,
            } => {
                client
                    .reset_password(&PasswordRequest {
                        credential,
                        password,
                    })
                    .await?
            }
            Self::Set {
                credential,
                password,
            } => {
                client
                    .set_password(&PasswordRequest {
                        credential,
                        password,
                    })
                    .await?
            }
        };
        println!("{}", response.message);
        Ok(())
    }
}

fn signed_in_practice(client: &LumifiClient) -> Result<String> {
    match client.session().snapshot().practice_account_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => bail!("Not signed in, run `lumifi login` first"),
    }
}

fn print_users(page: &UserPage) -> Result<()> {
    for row in &page.rows {
        let marker = if row.has_action_menu { " " } else { "*" };
        println!(
            "{marker} {}\t{} {}\t{}\t{}",
            row.user.id, row.user.first_name, row.user.last_name, row.user.role, row.user.email_id
        );
    }
    let pagination = &page.pagination;
    println!(
        "page {}/{} ({} total)",
        pagination.current_page, pagination.total_pages, pagination.total_items
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = std::io::stdout();
    stdout.write_all(label.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
