//! Household CLI commands.

use clap::{Args, Subcommand};

use super::{AppContext, OutputFormat};

#[derive(Args)]
pub struct HouseholdCommand {
    #[command(subcommand)]
    pub command: HouseholdSubcommand,
}

#[derive(Subcommand)]
pub enum HouseholdSubcommand {
    /// Show the signed-in user and their household
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

impl HouseholdCommand {
    pub fn run(&self, ctx: &AppContext) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            HouseholdSubcommand::Show { format } => {
                let user = ctx.session.user();
                let household = ctx.session.household();
                match format {
                    OutputFormat::Json => {
                        let output = serde_json::json!({
                            "user": user,
                            "household": household,
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Table => {
                        println!("{}", household.name);
                        println!("{}", "=".repeat(44));
                        println!("household id: {}", household.id);
                        println!("signed in as: {} ({})", user.display_name, user.id);
                        if let Some(email) = &user.email {
                            println!("email:        {}", email);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
