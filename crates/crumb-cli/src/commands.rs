//! Subcommands and their execution against a [`ConsentProvider`].

use anyhow::{Context as _, Result, bail};
use clap::Subcommand;
use crumb_consent::{CapabilityGate, ConsentProvider};
use crumb_core::{
  CookieDocument,
  consent::{ConsentCategory, PreferencesUpdate},
  profile::ProfileRecord,
};
use serde_json::{Map, Value};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Show the consent state and what it allows.
  Status,
  /// Grant every consent category.
  Accept,
  /// Refuse every optional category.
  Reject,
  /// Record a custom choice; categories left out keep their current value.
  Save {
    #[arg(long)]
    functional: Option<bool>,
    #[arg(long)]
    analytics:  Option<bool>,
    #[arg(long)]
    marketing:  Option<bool>,
  },
  /// Withdraw consent and delete the stored profile.
  Revoke,
  /// Print the stored profile as JSON.
  Show,
  /// Merge fields into the stored profile.
  Update {
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long)]
    email:        Option<String>,
    #[arg(long)]
    theme:        Option<String>,
    #[arg(long)]
    language:     Option<String>,
    #[arg(long)]
    role:         Option<String>,
    #[arg(long)]
    avatar:       Option<String>,
    /// Any top-level field, as `key=json`. Applied after the flags above.
    #[arg(long = "set", value_name = "KEY=JSON", value_parser = parse_pair)]
    set:          Vec<(String, Value)>,
  },
  /// Count one occurrence of an action.
  Track {
    action: String,
    /// Extra data to record with the action, as `key=json`.
    #[arg(long = "data", value_name = "KEY=JSON", value_parser = parse_pair)]
    data:   Vec<(String, Value)>,
  },
  /// Set one entry of the profile's preferences map.
  Preference {
    key:   String,
    #[arg(value_parser = parse_json)]
    value: Value,
  },
  /// Set one entry of the profile's settings map.
  Setting {
    key:   String,
    #[arg(value_parser = parse_json)]
    value: Value,
  },
  /// Delete the stored profile without touching consent.
  Clear,
  /// List every cookie visible to the page.
  Cookies,
}

pub fn run<D: CookieDocument>(provider: &mut ConsentProvider<D>, command: Command) -> Result<()> {
  let ok = match command {
    Command::Status => {
      print_status(provider);
      true
    }
    Command::Accept => provider.accept_all(),
    Command::Reject => provider.reject_all(),
    Command::Save {
      functional,
      analytics,
      marketing,
    } => {
      let update: PreferencesUpdate = [
        (ConsentCategory::Functional, functional),
        (ConsentCategory::Analytics, analytics),
        (ConsentCategory::Marketing, marketing),
      ]
      .into_iter()
      .filter_map(|(category, granted)| granted.map(|g| (category, g)))
      .collect();
      provider.save_preferences(&update)
    }
    Command::Revoke => provider.revoke(),
    Command::Show => {
      match provider.profile() {
        Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
        None => println!("no profile stored"),
      }
      true
    }
    Command::Update {
      display_name,
      email,
      theme,
      language,
      role,
      avatar,
      set,
    } => {
      let mut partial = ProfileRecord {
        display_name,
        email,
        theme,
        language,
        role,
        avatar,
        ..ProfileRecord::default()
      };
      for (key, value) in set {
        partial
          .set_field(&key, value)
          .with_context(|| format!("invalid value for `{key}`"))?;
      }
      provider.update_profile(&partial)
    }
    Command::Track { action, data } => {
      provider.track_action(&action, data.into_iter().collect::<Map<_, _>>())
    }
    Command::Preference { key, value } => provider.set_profile_preference(&key, value),
    Command::Setting { key, value } => provider.set_profile_setting(&key, value),
    Command::Clear => provider.clear_profile(),
    Command::Cookies => {
      for (name, value) in provider.cookie_store().enumerate() {
        println!("{name}={value}");
      }
      true
    }
  };

  if !ok {
    bail!("{}", provider.last_error().unwrap_or("operation failed"));
  }
  Ok(())
}

fn print_status<D: CookieDocument>(provider: &ConsentProvider<D>) {
  println!("state:           {}", provider.state());
  println!("cookies enabled: {}", provider.cookies_enabled());
  println!("banner visible:  {}", provider.banner_visible());
  for (category, granted) in provider.preferences().iter() {
    println!("  {category:<12} {}", if granted { "on" } else { "off" });
  }
}

/// Parse a JSON value, taking anything that is not valid JSON as a plain
/// string.
fn parse_json(raw: &str) -> Result<Value, String> {
  Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned())))
}

/// Parse `key=json`.
fn parse_pair(raw: &str) -> Result<(String, Value), String> {
  let (key, value) = raw
    .split_once('=')
    .ok_or_else(|| format!("expected KEY=JSON, got `{raw}`"))?;
  if key.is_empty() {
    return Err(format!("empty key in `{raw}`"));
  }
  Ok((key.to_owned(), parse_json(value)?))
}
