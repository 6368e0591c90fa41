use std::{
    num::{IntErrorKind, ParseIntError},
    str::FromStr,
    time::Duration,
};

use async_std::io::{self, prelude::*, BufRead, BufReader, ErrorKind, Write};
use tracing::{debug, error, info};

use crate::{config::Config, ReadByLine, Result};

const OUT_OF_RANGE: &[u8] = b"Incorrect line number. Try again:\n";
const MALFORMED: &[u8] = b"Incorrect input. Try to input integer value:\n";
const TIMEOUT_NOTICE: &[u8] = b"Input timeout\n";

/// Separates the line number from the lines text in the output
const SEPARATOR: char = '|';

/// A single request read from the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// `0`, ends the session
    Stop,
    /// A 1-based line number
    Line(usize),
    /// A number too large to be any line
    TooLarge,
}

impl FromStr for Query {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().parse::<usize>() {
            Ok(0) => Ok(Query::Stop),
            Ok(n) => Ok(Query::Line(n)),
            Err(err) if *err.kind() == IntErrorKind::PosOverflow => Ok(Query::TooLarge),
            Err(err) => Err(err),
        }
    }
}

/// How a query loop ended. Each of them is a normal termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user sent `0`
    Stopped,
    /// No request arrived in time and every line got printed
    Dumped,
    /// The console input reached its end
    InputClosed,
}

#[derive(Debug)]
enum State {
    AwaitInput,
    Dispatch,
    TimeoutDump,
    Terminated(Outcome),
}

/// Serves line requests from `input` until the user stops, the input ends or no request
/// arrives within `timeout`. Lines are printed as `<line>|<text>` to `output`.
#[derive(Debug)]
pub struct QueryLoop<'a, S, R, W> {
    source: &'a mut S,
    input: R,
    output: W,
    timeout: Duration,
    /// The last line read from `input`
    request: String,
    buf: Vec<u8>,
}

impl<'a, S, R, W> QueryLoop<'a, S, R, W>
where
    S: ReadByLine,
    R: BufRead + Unpin,
    W: Write + Unpin,
{
    pub fn new(source: &'a mut S, input: R, output: W, timeout: Duration) -> Self {
        Self {
            source,
            input,
            output,
            timeout,
            request: String::new(),
            buf: Vec::new(),
        }
    }

    /// Run the loop to its end. Errors are returned for failures of the console itself only,
    /// problems with a single request get reported and the loop carries on.
    pub async fn run(mut self) -> Result<Outcome> {
        self.banner().await?;

        let mut state = State::AwaitInput;
        loop {
            state = match state {
                State::AwaitInput => self.await_input().await?,
                State::Dispatch => self.dispatch().await?,
                State::TimeoutDump => self.dump().await?,
                State::Terminated(outcome) => {
                    self.output.flush().await?;
                    debug!(?outcome, "query loop terminated");
                    return Ok(outcome);
                }
            };
        }
    }

    async fn banner(&mut self) -> Result<()> {
        let banner = format!(
            "Input line number in file.\n\
             After {} program will print all file and close.\n\
             Input 0 to exit:\n",
            describe_timeout(self.timeout)
        );
        self.output.write_all(banner.as_bytes()).await?;
        Ok(())
    }

    async fn await_input(&mut self) -> Result<State> {
        self.output.flush().await?;
        self.request.clear();

        // A request is a whole line, so reading it also discards everything up to and including
        // the next terminator
        let read = io::timeout(self.timeout, self.input.read_line(&mut self.request)).await;

        match read {
            Ok(0) => Ok(State::Terminated(Outcome::InputClosed)),
            Ok(_) => Ok(State::Dispatch),
            Err(err) if err.kind() == ErrorKind::TimedOut => Ok(State::TimeoutDump),
            // Not UTF-8. The line is consumed already, treat it as any other garbage
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                self.output.write_all(MALFORMED).await?;
                Ok(State::AwaitInput)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn dispatch(&mut self) -> Result<State> {
        // Blank lines are skipped like any other whitespace
        if self.request.trim().is_empty() {
            return Ok(State::AwaitInput);
        }

        match self.request.parse::<Query>() {
            Ok(Query::Stop) => Ok(State::Terminated(Outcome::Stopped)),
            Ok(Query::Line(line)) => {
                self.print_line(line).await?;
                Ok(State::AwaitInput)
            }
            Ok(Query::TooLarge) => {
                self.output.write_all(OUT_OF_RANGE).await?;
                Ok(State::AwaitInput)
            }
            Err(_) => {
                self.output.write_all(MALFORMED).await?;
                Ok(State::AwaitInput)
            }
        }
    }

    async fn dump(&mut self) -> Result<State> {
        self.output.write_all(TIMEOUT_NOTICE).await?;
        info!(lines = self.source.total_lines(), "input timeout, printing all lines");

        for line in 1..=self.source.total_lines() {
            self.print_line(line).await?;
        }

        Ok(State::Terminated(Outcome::Dumped))
    }

    /// Prints `line` or the out of range notice. A line that can't be read is reported and
    /// skipped.
    async fn print_line(&mut self, line: usize) -> Result<()> {
        if !self.source.get_index().contains_line(line) {
            self.output.write_all(OUT_OF_RANGE).await?;
            return Ok(());
        }

        self.buf.clear();
        match self.source.read_line_raw(line, &mut self.buf).await {
            Ok(_) => {
                let prefix = format!("{}{}", line, SEPARATOR);
                self.output.write_all(prefix.as_bytes()).await?;
                self.output.write_all(&self.buf).await?;
            }
            Err(err) if err.is_recoverable() => {
                error!(line, %err, "cannot print line");
            }
            Err(err) => return Err(err),
        }

        Ok(())
    }
}

/// Whole seconds if the timeout has no fraction, milliseconds otherwise
fn describe_timeout(timeout: Duration) -> String {
    match (timeout.as_secs(), timeout.subsec_millis()) {
        (1, 0) => "1 second".to_owned(),
        (secs, 0) if secs > 0 => format!("{} seconds", secs),
        _ => format!("{} milliseconds", timeout.as_millis()),
    }
}

/// Serve requests for `source` on stdin/stdout.
pub async fn run_console<S: ReadByLine>(source: &mut S, config: &Config) -> Result<Outcome> {
    let input = BufReader::new(io::stdin());
    QueryLoop::new(source, input, io::stdout(), config.input_timeout)
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use std::{
        pin::Pin,
        task::{Context, Poll},
    };

    use async_std::io::{Cursor, Read};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{error::Error, index::LineTable, Indexable, IndexedBytes};

    const TIMEOUT: Duration = Duration::from_millis(50);
    const BANNER: &str = "Input line number in file.\nAfter 50 milliseconds program will print all file and close.\nInput 0 to exit:\n";

    /// Console input nobody ever types into
    struct Silent;

    impl Read for Silent {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut [u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Pending
        }
    }

    /// Console that's gone
    struct Broken;

    impl Read for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut [u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(ErrorKind::BrokenPipe, "console gone")))
        }
    }

    async fn run_with<S, R>(source: &mut S, input: R) -> (Result<Outcome>, String)
    where
        S: ReadByLine,
        R: BufRead + Unpin,
    {
        let mut out = Vec::new();
        let res = QueryLoop::new(source, input, &mut out, TIMEOUT).run().await;
        (res, String::from_utf8(out).unwrap())
    }

    fn abc() -> IndexedBytes {
        IndexedBytes::new(&b"a\nbb\nccc\n"[..]).unwrap()
    }

    #[test]
    fn test_parse_query() {
        assert_eq!("0".parse::<Query>(), Ok(Query::Stop));
        assert_eq!(" 7 \n".parse::<Query>(), Ok(Query::Line(7)));
        assert!("-1".parse::<Query>().is_err());
        assert!("abc".parse::<Query>().is_err());
        assert!("1 2".parse::<Query>().is_err());
        assert_eq!(
            "99999999999999999999999".parse::<Query>(),
            Ok(Query::TooLarge)
        );
    }

    #[test]
    fn test_describe_timeout() {
        assert_eq!(describe_timeout(Duration::from_millis(5000)), "5 seconds");
        assert_eq!(describe_timeout(Duration::from_secs(1)), "1 second");
        assert_eq!(describe_timeout(Duration::from_millis(1500)), "1500 milliseconds");
        assert_eq!(describe_timeout(Duration::from_millis(200)), "200 milliseconds");
        assert_eq!(describe_timeout(Duration::ZERO), "0 milliseconds");
    }

    #[async_std::test]
    async fn test_banner_in_seconds() {
        let mut source = abc();
        let mut out = Vec::new();
        let input = Cursor::new(b"0\n".to_vec());

        let res = QueryLoop::new(&mut source, input, &mut out, Duration::from_secs(5))
            .run()
            .await;

        assert_eq!(res.unwrap(), Outcome::Stopped);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Input line number in file.\nAfter 5 seconds program will print all file and close.\nInput 0 to exit:\n"
        );
    }

    #[async_std::test]
    async fn test_too_large_number_is_out_of_range() {
        let mut source = abc();
        let input = Cursor::new(b"99999999999999999999999\n1\n0\n".to_vec());

        let (res, out) = run_with(&mut source, input).await;

        assert_eq!(res.unwrap(), Outcome::Stopped);
        assert_eq!(
            out,
            format!("{}Incorrect line number. Try again:\n1|a\n", BANNER)
        );
    }

    #[async_std::test]
    async fn test_console_failure_terminates() {
        let mut source = abc();
        let (res, out) = run_with(&mut source, BufReader::new(Broken)).await;

        assert!(matches!(res, Err(Error::Io(e)) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(out, BANNER);
    }

    #[async_std::test]
    async fn test_requests() {
        let mut source = abc();
        let input = Cursor::new(b"2\n5\nabc\n\n1\n0\n3\n".to_vec());

        let (res, out) = run_with(&mut source, input).await;

        assert_eq!(res.unwrap(), Outcome::Stopped);
        assert_eq!(
            out,
            format!(
                "{}2|bb\nIncorrect line number. Try again:\nIncorrect input. Try to input integer value:\n1|a\n",
                BANNER
            )
        );
    }

    #[async_std::test]
    async fn test_zero_on_empty_table() {
        let mut source = IndexedBytes::new(Vec::<u8>::new()).unwrap();
        let (res, out) = run_with(&mut source, Cursor::new(b"1\n0\n".to_vec())).await;

        assert_eq!(res.unwrap(), Outcome::Stopped);
        assert_eq!(out, format!("{}Incorrect line number. Try again:\n", BANNER));

        let (res, out) = run_with(&mut source, Cursor::new(b"0\n".to_vec())).await;
        assert_eq!(res.unwrap(), Outcome::Stopped);
        assert_eq!(out, BANNER);
    }

    #[async_std::test]
    async fn test_timeout_dump() {
        let mut source = abc();
        let (res, out) = run_with(&mut source, BufReader::new(Silent)).await;

        assert_eq!(res.unwrap(), Outcome::Dumped);
        assert_eq!(out, format!("{}Input timeout\n1|a\n2|bb\n3|ccc\n", BANNER));
    }

    #[async_std::test]
    async fn test_timeout_after_requests() {
        let mut source = abc();
        let input = BufReader::new(Cursor::new(b"3\n".to_vec()).chain(Silent));

        let (res, out) = run_with(&mut source, input).await;

        assert_eq!(res.unwrap(), Outcome::Dumped);
        assert_eq!(
            out,
            format!("{}3|ccc\nInput timeout\n1|a\n2|bb\n3|ccc\n", BANNER)
        );
    }

    #[async_std::test]
    async fn test_input_closed() {
        let mut source = abc();
        let (res, out) = run_with(&mut source, Cursor::new(b"1\n".to_vec())).await;

        assert_eq!(res.unwrap(), Outcome::InputClosed);
        assert_eq!(out, format!("{}1|a\n", BANNER));
    }

    #[async_std::test]
    async fn test_invalid_utf8_is_malformed() {
        let mut source = abc();
        let input = Cursor::new(b"\xff\xfe\n2\n0\n".to_vec());

        let (res, out) = run_with(&mut source, input).await;

        assert_eq!(res.unwrap(), Outcome::Stopped);
        assert_eq!(
            out,
            format!("{}Incorrect input. Try to input integer value:\n2|bb\n", BANNER)
        );
    }

    /// Fails reading every even line
    struct Flaky(IndexedBytes);

    impl Indexable for Flaky {
        fn get_index(&self) -> &LineTable {
            self.0.get_index()
        }
    }

    #[async_trait]
    impl ReadByLine for Flaky {
        async fn read_line_raw(&mut self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
            if line % 2 == 0 {
                return Err(Error::Io(io::Error::new(ErrorKind::Other, "flaky")));
            }
            self.0.read_line_raw(line, buf).await
        }
    }

    #[async_std::test]
    async fn test_read_failure_keeps_loop_alive() {
        let mut source = Flaky(abc());
        let input = Cursor::new(b"2\n3\n0\n".to_vec());

        let (res, out) = run_with(&mut source, input).await;
        assert_eq!(res.unwrap(), Outcome::Stopped);
        assert_eq!(out, format!("{}3|ccc\n", BANNER));

        let (res, out) = run_with(&mut source, BufReader::new(Silent)).await;
        assert_eq!(res.unwrap(), Outcome::Dumped);
        assert_eq!(out, format!("{}Input timeout\n1|a\n3|ccc\n", BANNER));
    }
}
