// src/frontend/controls.rs - User control grammar

use std::path::PathBuf;
use std::str::FromStr;

use crate::backend::types::Point;

/// Help shown by the `help` control
pub const HELP_TEXT: &str = "\
Controls:
  load <path>     load a JPEG/PNG image
  capture         grab one frame from the camera
  click <x> <y>   select a point (two per measurement)
  detect          find a line and use its endpoints
  calc            calculate the distance between the points
  save            write the record and annotated image
  points          show the selected points
  status          show the session state
  reset           clear points, keep the image
  help            show this help
  quit | exit     leave";

/// One parsed user control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Load(PathBuf),
    Capture,
    Click(Point),
    Detect,
    Calculate,
    Save,
    Points,
    Status,
    Reset,
    Help,
    Quit,
}

/// Control parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlParseError {
    #[error("empty control")]
    Empty,

    #[error("unknown control '{0}', type 'help' for the list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid coordinate '{0}'")]
    Coordinate(String),
}

impl FromStr for Control {
    type Err = ControlParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        if verb.is_empty() {
            return Err(ControlParseError::Empty);
        }

        let no_args = |control: Control, usage: &'static str| {
            if rest.is_empty() {
                Ok(control)
            } else {
                Err(ControlParseError::Usage(usage))
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "load" | "open" => {
                if rest.is_empty() {
                    Err(ControlParseError::Usage("load <path>"))
                } else {
                    Ok(Control::Load(PathBuf::from(rest)))
                }
            }
            "click" => parse_click(rest),
            "capture" => no_args(Control::Capture, "capture"),
            "detect" => no_args(Control::Detect, "detect"),
            "calc" | "calculate" => no_args(Control::Calculate, "calc"),
            "save" => no_args(Control::Save, "save"),
            "points" => no_args(Control::Points, "points"),
            "status" => no_args(Control::Status, "status"),
            "reset" => no_args(Control::Reset, "reset"),
            "help" | "?" => Ok(Control::Help),
            "quit" | "exit" => Ok(Control::Quit),
            other => Err(ControlParseError::Unknown(other.to_string())),
        }
    }
}

/// `click X Y` or `click X,Y`
fn parse_click(rest: &str) -> Result<Control, ControlParseError> {
    const USAGE: &str = "click <x> <y>";
    let args: Vec<&str> = rest.split_whitespace().collect();
    let point = match args.as_slice() {
        [x, y] => {
            let x = x
                .parse::<u32>()
                .map_err(|_| ControlParseError::Coordinate(x.to_string()))?;
            let y = y
                .parse::<u32>()
                .map_err(|_| ControlParseError::Coordinate(y.to_string()))?;
            Point::new(x, y)
        }
        [pair] => pair
            .parse::<Point>()
            .map_err(|_| ControlParseError::Coordinate(pair.to_string()))?,
        _ => return Err(ControlParseError::Usage(USAGE)),
    };
    Ok(Control::Click(point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_controls() {
        assert_eq!("click 10 20".parse(), Ok(Control::Click(Point::new(10, 20))));
        assert_eq!("CLICK 3,4".parse(), Ok(Control::Click(Point::new(3, 4))));
        assert_eq!("  calc ".parse(), Ok(Control::Calculate));
        assert_eq!("exit".parse(), Ok(Control::Quit));
        assert_eq!(
            "load my images/cement.jpg".parse(),
            Ok(Control::Load(PathBuf::from("my images/cement.jpg")))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Control>(), Err(ControlParseError::Empty));
        assert!(matches!("jump".parse::<Control>(), Err(ControlParseError::Unknown(_))));
        assert!(matches!("load".parse::<Control>(), Err(ControlParseError::Usage(_))));
        assert!(matches!("click 5".parse::<Control>(), Err(ControlParseError::Coordinate(_))));
        assert!(matches!("click 1 2 3".parse::<Control>(), Err(ControlParseError::Usage(_))));
        assert_eq!(
            "click -1 4".parse::<Control>(),
            Err(ControlParseError::Coordinate("-1".to_string()))
        );
        assert!(matches!("save now".parse::<Control>(), Err(ControlParseError::Usage(_))));
    }
}
