use campus_nav::{LatLng, TravelMode, Urgency};

#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    Help,
    Cancel,
    Mode(TravelMode),
    Urgency(Urgency),
    Navigate {
        destination: LatLng,
        name: Option<String>,
    },
    Stop,
    Where,
    Quit,
    /// Known command with missing or malformed arguments.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
Type a question to ask the assistant. Commands:
  /mode <walking|taxi|urgent>     travel mode for queries and routes
  /urgency <normal|high>          urgency forwarded with queries
  /navigate <lat> <lng> [name]    follow a route to a destination
  /stop                           stop route recalculation
  /where                          show the current position
  /cancel                         cancel the streaming answer
  /quit                           exit";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut words = trimmed.split_whitespace();
    let command = words.next().unwrap_or(trimmed).to_string();
    let arguments: Vec<&str> = words.collect();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/cancel" => SlashCommand::Cancel,
        "/stop" => SlashCommand::Stop,
        "/where" => SlashCommand::Where,
        "/quit" | "/exit" => SlashCommand::Quit,
        "/mode" => match arguments.first().and_then(|value| TravelMode::parse(value)) {
            Some(mode) => SlashCommand::Mode(mode),
            None => SlashCommand::Usage("/mode <walking|taxi|urgent>"),
        },
        "/urgency" => match arguments.first().and_then(|value| Urgency::parse(value)) {
            Some(urgency) => SlashCommand::Urgency(urgency),
            None => SlashCommand::Usage("/urgency <normal|high>"),
        },
        "/navigate" => parse_navigate(&arguments),
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

fn parse_navigate(arguments: &[&str]) -> SlashCommand {
    const USAGE: &str = "/navigate <lat> <lng> [name]";

    let coordinate = match arguments {
        [lat, lng, ..] => parse_coordinate(lat, lng),
        _ => None,
    };
    let Some(destination) = coordinate else {
        return SlashCommand::Usage(USAGE);
    };

    let name = arguments[2..].join(" ");
    SlashCommand::Navigate {
        destination,
        name: (!name.is_empty()).then_some(name),
    }
}

/// Parses a `lat,lng` pair as accepted by `--fix`.
pub fn parse_lat_lng(value: &str) -> Result<LatLng, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `<lat>,<lng>`, got '{value}'"))?;
    parse_coordinate(lat, lng).ok_or_else(|| format!("invalid coordinate '{value}'"))
}

fn parse_coordinate(lat: &str, lng: &str) -> Option<LatLng> {
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    let valid = lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng);
    valid.then_some(LatLng::new(lat, lng))
}
