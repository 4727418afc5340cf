//! Keyboard and mouse input on a background thread
//!
//! The reader thread only decodes bytes and forwards events; it never touches
//! render state. Events go through a bounded channel the frame loop drains.

use std::io::{self, Read};
use std::thread;

use crossbeam_channel::{Receiver, Sender};

const INPUT_CHANNEL_CAPACITY: usize = 64;
const READ_BUFFER_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Printable ASCII key
    Key(char),
    /// Zero-based cell position of the pointer
    Mouse {
        button: MouseButton,
        action: MouseAction,
        x: u16,
        y: u16,
    },
    /// Ctrl+C, `q` or a lone Esc
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// Releases in X10 form and plain motion
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Up,
    /// Pointer moved, with `button` held if any
    Move,
    ScrollUp,
    ScrollDown,
}

/// Longest SGR mouse parameter string, `"bbb;xxxxx;yyyyy"`
const MAX_SGR_PARAMS: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DecodeState {
    #[default]
    Ground,
    /// Seen ESC
    Escape,
    /// Seen `ESC [`, nothing after it yet
    CsiStart,
    /// Inside a CSI sequence, waiting for the final byte
    Csi,
    /// Seen `ESC O`, one byte left
    Ss3,
    /// `ESC [ M` followed by three raw bytes
    X10 { bytes: [u8; 3], len: usize },
    /// `ESC [ <` parameters up to the closing `M` or `m`
    Sgr(String),
}

/// Byte stream to key and mouse events. Other escape sequences (arrows,
/// function keys, Alt combinations) are swallowed. An ESC that ends a read
/// is a lone Esc.
#[derive(Debug, Default)]
pub struct InputDecoder {
    state: DecodeState,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one read's worth of bytes
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for &b in bytes {
            let state = std::mem::take(&mut self.state);
            self.state = match state {
                DecodeState::Ground => match b {
                    0x1b => DecodeState::Escape,
                    0x03 | b'q' => {
                        events.push(InputEvent::Quit);
                        DecodeState::Ground
                    }
                    b' '..=b'~' => {
                        events.push(InputEvent::Key(b as char));
                        DecodeState::Ground
                    }
                    // Other control bytes and non-ASCII
                    _ => DecodeState::Ground,
                },
                DecodeState::Escape => match b {
                    b'[' => DecodeState::CsiStart,
                    b'O' => DecodeState::Ss3,
                    _ => DecodeState::Ground,
                },
                DecodeState::CsiStart => match b {
                    b'M' => DecodeState::X10 { bytes: [0; 3], len: 0 },
                    b'<' => DecodeState::Sgr(String::new()),
                    0x40..=0x7e => DecodeState::Ground,
                    _ => DecodeState::Csi,
                },
                DecodeState::Csi if (0x40..=0x7e).contains(&b) => DecodeState::Ground,
                DecodeState::Csi => DecodeState::Csi,
                DecodeState::Ss3 => DecodeState::Ground,
                DecodeState::X10 { mut bytes, len } => {
                    bytes[len] = b;
                    if len + 1 < bytes.len() {
                        DecodeState::X10 { bytes, len: len + 1 }
                    } else {
                        events.extend(decode_x10(bytes));
                        DecodeState::Ground
                    }
                }
                DecodeState::Sgr(mut params) => match b {
                    b'M' | b'm' => {
                        events.extend(decode_sgr(&params, b == b'm'));
                        DecodeState::Ground
                    }
                    b'0'..=b'9' | b';' if params.len() < MAX_SGR_PARAMS => {
                        params.push(b as char);
                        DecodeState::Sgr(params)
                    }
                    // Malformed, drop the rest like any other sequence
                    0x40..=0x7e => DecodeState::Ground,
                    _ => DecodeState::Csi,
                },
            };
        }

        if self.state == DecodeState::Escape {
            events.push(InputEvent::Quit);
            self.state = DecodeState::Ground;
        }

        events
    }
}

/// Button code shared by both mouse encodings
fn mouse_event(code: u16, released: bool, x: u16, y: u16) -> InputEvent {
    let button = match code & 0b11 {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::None,
    };

    let action = if code & 64 != 0 {
        if code & 0b1 == 0 {
            MouseAction::ScrollUp
        } else {
            MouseAction::ScrollDown
        }
    } else if code & 32 != 0 {
        MouseAction::Move
    } else if released || button == MouseButton::None {
        MouseAction::Up
    } else {
        MouseAction::Down
    };

    let button = if code & 64 != 0 { MouseButton::None } else { button };
    InputEvent::Mouse { button, action, x, y }
}

/// `ESC [ M` form: button, column and row each offset by 32, one-based
fn decode_x10(bytes: [u8; 3]) -> Option<InputEvent> {
    let [code, x, y] = bytes.map(|b| (b as u16).checked_sub(32));
    Some(mouse_event(code?, false, x?.checked_sub(1)?, y?.checked_sub(1)?))
}

/// `ESC [ < b ; x ; y M` form, `m` for a release, one-based positions
fn decode_sgr(params: &str, released: bool) -> Option<InputEvent> {
    let mut fields = params.split(';').map(|f| f.parse::<u16>().ok());
    let code = fields.next()??;
    let x = fields.next()??;
    let y = fields.next()??;
    if fields.next().is_some() {
        return None;
    }
    Some(mouse_event(code, released, x.saturating_sub(1), y.saturating_sub(1)))
}

/// Start a thread decoding `reader` into [`InputEvent`]s.
///
/// The thread stops at end of input, on a read error, or once the receiver
/// is dropped and the next event can't be delivered.
pub fn spawn_input_reader<R>(mut reader: R) -> io::Result<Receiver<InputEvent>>
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = crossbeam_channel::bounded(INPUT_CHANNEL_CAPACITY);

    thread::Builder::new()
        .name("input".into())
        .spawn(move || {
            read_loop(&mut reader, &sender);
            log::debug!("input reader stopped");
        })?;

    Ok(receiver)
}

fn read_loop<R: Read>(reader: &mut R, sender: &Sender<InputEvent>) {
    let mut decoder = InputDecoder::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("reading input failed: {}", e);
                return;
            }
        };

        for event in decoder.feed(&buf[..n]) {
            if sender.send(event).is_err() {
                // Receiver gone, nobody is listening anymore
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn test_plain_keys() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"wAs "),
            vec![
                InputEvent::Key('w'),
                InputEvent::Key('A'),
                InputEvent::Key('s'),
                InputEvent::Key(' ')
            ]
        );
    }

    #[test]
    fn test_quit_keys() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"q"), vec![InputEvent::Quit]);
        assert_eq!(decoder.feed(&[0x03]), vec![InputEvent::Quit]);
        assert_eq!(decoder.feed(&[0x1b]), vec![InputEvent::Quit]);
    }

    #[test]
    fn test_escape_sequences_swallowed() {
        let mut decoder = InputDecoder::new();
        // Up arrow, F1 (SS3), F5 (CSI with parameters), Alt+x
        assert_eq!(decoder.feed(b"\x1b[Aa\x1bOPb\x1b[15~c\x1bxd"), vec![
            InputEvent::Key('a'),
            InputEvent::Key('b'),
            InputEvent::Key('c'),
            InputEvent::Key('d'),
        ]);
    }

    #[test]
    fn test_sequence_split_across_reads() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\x1b[1;").is_empty());
        assert_eq!(decoder.feed(b"5Cw"), vec![InputEvent::Key('w')]);
    }

    fn mouse(button: MouseButton, action: MouseAction, x: u16, y: u16) -> InputEvent {
        InputEvent::Mouse { button, action, x, y }
    }

    #[test]
    fn test_sgr_mouse() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[<0;10;5M\x1b[<32;12;6M\x1b[<0;12;6mw"),
            vec![
                mouse(MouseButton::Left, MouseAction::Down, 9, 4),
                mouse(MouseButton::Left, MouseAction::Move, 11, 5),
                mouse(MouseButton::Left, MouseAction::Up, 11, 5),
                InputEvent::Key('w'),
            ]
        );
        assert_eq!(
            decoder.feed(b"\x1b[<2;300;1M\x1b[<64;1;1M\x1b[<65;1;1M"),
            vec![
                mouse(MouseButton::Right, MouseAction::Down, 299, 0),
                mouse(MouseButton::None, MouseAction::ScrollUp, 0, 0),
                mouse(MouseButton::None, MouseAction::ScrollDown, 0, 0),
            ]
        );
    }

    #[test]
    fn test_x10_mouse() {
        let mut decoder = InputDecoder::new();
        // Left press at column 1, row 1; then release at column 3, row 2
        assert_eq!(
            decoder.feed(&[0x1b, b'[', b'M', 32, 33, 33, 0x1b, b'[', b'M', 35, 35, 34]),
            vec![
                mouse(MouseButton::Left, MouseAction::Down, 0, 0),
                mouse(MouseButton::None, MouseAction::Up, 2, 1),
            ]
        );
        // Raw position bytes may be anything, including 'q'
        assert_eq!(
            decoder.feed(&[0x1b, b'[', b'M', 64, b'q', b'q']),
            vec![mouse(MouseButton::Left, MouseAction::Move, 80, 80)]
        );
    }

    #[test]
    fn test_mouse_split_across_reads() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\x1b[<0;4").is_empty());
        assert_eq!(decoder.feed(b"2;7Ma"), vec![mouse(MouseButton::Left, MouseAction::Down, 41, 6), InputEvent::Key('a')]);
    }

    #[test]
    fn test_malformed_sgr_dropped() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"\x1b[<0;5Mb\x1b[<1;2;3;4Mc\x1b[<0;xd"), vec![InputEvent::Key('b'), InputEvent::Key('c'), InputEvent::Key('d')]);
    }

    #[test]
    fn test_control_bytes_ignored() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\r\n\t\x7f\xc3\xa9").is_empty());
    }

    #[test]
    fn test_reader_thread_forwards_events() {
        let receiver = spawn_input_reader(Cursor::new(b"wdq".to_vec())).unwrap();
        let events: Vec<InputEvent> = (0..3)
            .map(|_| receiver.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(events, vec![InputEvent::Key('w'), InputEvent::Key('d'), InputEvent::Quit]);

        // End of input closes the channel
        assert!(receiver.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
