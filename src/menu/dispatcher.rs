use super::command::{Command, Selection, TransactionKind, accept_fault_flag};
use super::input::InputReader;
use super::output::{NO_SUCH_OPTION, RESULT_PREFIX, SUCCESS_BANNER, format_json};
use crate::error::{ClientError, GatewayError};
use crate::network::Contract;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    AwaitingSelection,
    Exited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Dispatch(Selection),
    Exit,
    Unknown(String),
}

impl MenuState {
    pub fn on_input(self, token: &str) -> (MenuState, Transition) {
        if self == MenuState::Exited {
            return (MenuState::Exited, Transition::Exit);
        }
        match token.parse::<i64>().ok().and_then(Selection::from_code) {
            Some(Selection::Exit) => (MenuState::Exited, Transition::Exit),
            Some(selection) => (MenuState::AwaitingSelection, Transition::Dispatch(selection)),
            None => (
                MenuState::AwaitingSelection,
                Transition::Unknown(token.to_string()),
            ),
        }
    }
}

/// What a successful ledger call renders as.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Committed,
    Result(String),
}

pub async fn perform<C: Contract + ?Sized>(
    contract: &C,
    command: &Command,
) -> Result<Outcome, ClientError> {
    let name = command.transaction_name();
    let args = command.args();

    match command.kind() {
        TransactionKind::Submit => {
            contract
                .submit_transaction(name, &args)
                .await
                .map_err(ClientError::LedgerSubmit)?;
            Ok(Outcome::Committed)
        }
        TransactionKind::Evaluate => {
            let payload = contract
                .evaluate_transaction(name, &args)
                .await
                .map_err(ClientError::LedgerEvaluate)?;
            let formatted = format_json(&payload).map_err(|e| {
                ClientError::LedgerEvaluate(GatewayError::Malformed(format!(
                    "result is not JSON: {e}"
                )))
            })?;
            Ok(Outcome::Result(formatted))
        }
    }
}

/// Result of prompting for a selection's arguments.
enum Prompted {
    Ready(Command),
    Exit,
    EndOfInput,
}

/// Interactive menu loop bound to one contract.
pub struct Dispatcher<'a, C: ?Sized, R, W> {
    contract: &'a C,
    input: InputReader<R>,
    output: W,
    state: MenuState,
}

impl<'a, C, R, W> Dispatcher<'a, C, R, W>
where
    C: Contract + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(contract: &'a C, input: R, output: W) -> Self {
        Self {
            contract,
            input: InputReader::new(input),
            output,
            state: MenuState::AwaitingSelection,
        }
    }

    /// Runs until exit is selected or input ends.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        while self.state == MenuState::AwaitingSelection {
            self.print_menu()?;
            let Some(token) = self.input.next_token()? else {
                log::debug!("end of input, leaving menu");
                self.state = MenuState::Exited;
                break;
            };

            let (next, transition) = self.state.on_input(&token);
            self.state = next;
            match transition {
                Transition::Exit => break,
                Transition::Unknown(token) => {
                    log::debug!("unknown menu selection {:?}", token);
                    write!(self.output, "{NO_SUCH_OPTION}")?;
                }
                Transition::Dispatch(selection) => match self.dispatch(selection).await {
                    Ok(()) => {}
                    Err(err) if err.kind().is_fatal() => return Err(err),
                    Err(err) => {
                        log::warn!("{:?} failed: {}", selection, err);
                        writeln!(self.output, "{err}")?;
                    }
                },
            }
            if self.state == MenuState::Exited {
                break;
            }
            writeln!(self.output)?;
        }
        self.output.flush()?;
        Ok(())
    }

    async fn dispatch(&mut self, selection: Selection) -> Result<(), ClientError> {
        let command = match self.read_command(selection)? {
            Prompted::Ready(command) => command,
            Prompted::Exit => {
                self.state = MenuState::Exited;
                return Ok(());
            }
            Prompted::EndOfInput => {
                log::debug!("end of input while prompting for {:?}", selection);
                self.state = MenuState::Exited;
                return Ok(());
            }
        };

        match perform(self.contract, &command).await? {
            Outcome::Committed => writeln!(self.output, "{SUCCESS_BANNER}")?,
            Outcome::Result(json) => writeln!(self.output, "{RESULT_PREFIX}{json}")?,
        }
        Ok(())
    }

    fn print_menu(&mut self) -> Result<(), ClientError> {
        writeln!(self.output, "Menu, choose option: ")?;
        for selection in Selection::ALL {
            writeln!(self.output, "{}: {}", selection.code(), selection.label())?;
        }
        self.output.flush()?;
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>, ClientError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(self.input.next_token()?)
    }

    fn read_command(&mut self, selection: Selection) -> Result<Prompted, ClientError> {
        macro_rules! ask {
            ($dispatcher:ident, $text:expr) => {
                match $dispatcher.prompt($text)? {
                    Some(value) => value,
                    None => return Ok(Prompted::EndOfInput),
                }
            };
        }

        let command = match selection {
            Selection::InitLedger => {
                writeln!(self.output, "Initializing ledger...")?;
                Command::InitLedger
            }
            Selection::ReadPersonAsset => Command::ReadPersonAsset {
                person_id: ask!(self, "Person ID: "),
            },
            Selection::ReadCarAsset => Command::ReadCarAsset {
                car_id: ask!(self, "Car ID: "),
            },
            Selection::GetCarsByColor => Command::GetCarsByColor {
                color: ask!(self, "Car color: "),
            },
            Selection::GetCarsByColorAndOwner => {
                let color = ask!(self, "Car color: ");
                let owner_id = ask!(self, "Car owner: ");
                Command::GetCarsByColorAndOwner { color, owner_id }
            }
            Selection::TransferCarAsset => {
                let car_id = ask!(self, "Car ID: ");
                let new_owner_id = ask!(self, "New owner ID: ");
                let answer = ask!(self, "Accept faulted car? (Y/n): ");
                Command::TransferCarAsset {
                    car_id,
                    new_owner_id,
                    accept_fault: accept_fault_flag(&answer),
                }
            }
            Selection::AddCarFault => {
                let car_id = ask!(self, "Car ID: ");
                writeln!(self.output, "Fault description:")?;
                self.output.flush()?;
                let Some(description) = self.input.next_line()? else {
                    return Ok(Prompted::EndOfInput);
                };
                let price = ask!(self, "Fault repair price: ");
                let repair_price = match price.parse::<f32>() {
                    Ok(value) if value.is_finite() => value,
                    _ => {
                        return Err(ClientError::InputParse(format!(
                            "repair price {price:?} is not a number"
                        )));
                    }
                };
                Command::AddCarFault {
                    car_id,
                    description,
                    repair_price,
                }
            }
            Selection::ChangeCarColor => {
                let car_id = ask!(self, "Car ID: ");
                let new_color = ask!(self, "New car color: ");
                Command::ChangeCarColor { car_id, new_color }
            }
            Selection::RepairCar => Command::RepairCar {
                car_id: ask!(self, "Car ID: "),
            },
            Selection::Exit => return Ok(Prompted::Exit),
        };
        Ok(Prompted::Ready(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::ErrorKind;
    use std::collections::HashMap;
    use std::io::{self, Cursor, Read};
    use std::sync::Mutex;

    type Call = (TransactionKind, String, Vec<String>);

    #[derive(Default)]
    struct RecordingContract {
        calls: Mutex<Vec<Call>>,
        results: HashMap<String, Vec<u8>>,
        failing: bool,
    }

    impl RecordingContract {
        fn with_result(name: &str, payload: &str) -> Self {
            let mut contract = Self::default();
            contract
                .results
                .insert(name.to_string(), payload.as_bytes().to_vec());
            contract
        }

        fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(
            &self,
            kind: TransactionKind,
            name: &str,
            args: &[String],
        ) -> Result<Vec<u8>, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((kind, name.to_string(), args.to_vec()));
            if self.failing {
                return Err(GatewayError::Status(tonic::Status::unavailable(
                    "peer unreachable",
                )));
            }
            Ok(self.results.get(name).cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl Contract for RecordingContract {
        async fn submit_transaction(
            &self,
            name: &str,
            args: &[String],
        ) -> Result<Vec<u8>, GatewayError> {
            self.record(TransactionKind::Submit, name, args)
        }

        async fn evaluate_transaction(
            &self,
            name: &str,
            args: &[String],
        ) -> Result<Vec<u8>, GatewayError> {
            self.record(TransactionKind::Evaluate, name, args)
        }
    }

    fn run_session(contract: &RecordingContract, script: &str) -> String {
        let mut dispatcher = Dispatcher::new(contract, Cursor::new(script.to_string()), Vec::new());
        tokio_test::block_on(dispatcher.run()).unwrap();
        assert_eq!(dispatcher.state, MenuState::Exited);
        String::from_utf8(dispatcher.output).unwrap()
    }

    fn call(kind: TransactionKind, name: &str, args: &[&str]) -> Call {
        (
            kind,
            name.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        )
    }

    #[test]
    fn state_machine_transitions() {
        let state = MenuState::AwaitingSelection;
        assert_eq!(
            state.on_input("2"),
            (
                MenuState::AwaitingSelection,
                Transition::Dispatch(Selection::ReadCarAsset)
            )
        );
        assert_eq!(state.on_input("9"), (MenuState::Exited, Transition::Exit));
        assert_eq!(
            state.on_input("42"),
            (
                MenuState::AwaitingSelection,
                Transition::Unknown("42".to_string())
            )
        );
        assert_eq!(
            state.on_input("abc"),
            (
                MenuState::AwaitingSelection,
                Transition::Unknown("abc".to_string())
            )
        );
        assert_eq!(
            MenuState::Exited.on_input("0"),
            (MenuState::Exited, Transition::Exit)
        );
    }

    #[test]
    fn every_selection_dispatches_one_call() {
        let contract = RecordingContract {
            results: [
                "ReadPersonAsset",
                "ReadCarAsset",
                "GetCarsByColor",
                "GetCarsByColorAndOwner",
            ]
            .into_iter()
            .map(|name| (name.to_string(), b"[]".to_vec()))
            .collect(),
            ..RecordingContract::default()
        };
        let script = "0\n\
                      1\nPERSON1\n\
                      2\nCAR1\n\
                      3\nred\n\
                      4\nred\nPERSON2\n\
                      5\nCAR1\nPERSON2\nn\n\
                      6\nCAR1\nbroken rear light\n120.5\n\
                      7\nCAR1\ngreen\n\
                      8\nCAR1\n\
                      9\n";
        run_session(&contract, script);

        use TransactionKind::{Evaluate, Submit};
        assert_eq!(
            contract.calls(),
            vec![
                call(Submit, "InitLedger", &[]),
                call(Evaluate, "ReadPersonAsset", &["PERSON1"]),
                call(Evaluate, "ReadCarAsset", &["CAR1"]),
                call(Evaluate, "GetCarsByColor", &["red"]),
                call(Evaluate, "GetCarsByColorAndOwner", &["red", "PERSON2"]),
                call(Submit, "TransferCarAsset", &["CAR1", "PERSON2", "false"]),
                call(
                    Submit,
                    "AddCarfault",
                    &["CAR1", "broken rear light", "120.500000"]
                ),
                call(Submit, "ChangeCarColor", &["CAR1", "green"]),
                call(Submit, "RepairCar", &["CAR1"]),
            ]
        );
    }

    #[test]
    fn init_then_read_then_exit() {
        let contract = RecordingContract::with_result(
            "ReadCarAsset",
            r#"{"ID":"CAR1","color":"blue","ownerID":"PERSON1"}"#,
        );
        let output = run_session(&contract, "0\n2\nCAR1\n9\n");

        assert!(output.contains("Initializing ledger...\n######## Success ########\n"));
        assert!(output.contains(
            "Car ID: ######## Result:{\n\"ID\": \"CAR1\",\n\"color\": \"blue\",\n\"ownerID\": \"PERSON1\"\n}\n"
        ));
        // menu shown for 0, 2 and 9, nothing after exit
        assert_eq!(output.matches("Menu, choose option: ").count(), 3);
        assert!(output.ends_with("9: Exit\n"));
    }

    #[test]
    fn unknown_selection_keeps_session_usable() {
        let contract = RecordingContract::default();
        let output = run_session(&contract, "42\nhello\n8\nCAR7\n9\n");

        assert_eq!(output.matches(NO_SUCH_OPTION).count(), 2);
        assert_eq!(
            contract.calls(),
            vec![call(TransactionKind::Submit, "RepairCar", &["CAR7"])]
        );
        assert!(output.contains(SUCCESS_BANNER));
    }

    #[test]
    fn transfer_flag_only_declines_on_n() {
        let contract = RecordingContract::default();
        run_session(
            &contract,
            "5\nC1\nP1\nn\n5\nC1\nP1\nN\n5\nC1\nP1\nno\n5\nC1\nP1\nY\n9\n",
        );

        let flags: Vec<String> = contract
            .calls()
            .into_iter()
            .map(|(_, _, args)| args[2].clone())
            .collect();
        assert_eq!(flags, ["false", "true", "true", "true"]);
    }

    #[test]
    fn failures_are_reported_and_loop_continues() {
        let contract = RecordingContract::failing();
        let output = run_session(&contract, "0\n3\nblue\n9\n");

        assert!(output.contains("failed to submit transaction: gateway returned"));
        assert!(output.contains("failed to evaluate transaction: gateway returned"));
        assert!(!output.contains(SUCCESS_BANNER));
        assert_eq!(contract.calls().len(), 2);
    }

    #[test]
    fn non_json_result_is_an_evaluate_error() {
        let contract = RecordingContract::with_result("ReadCarAsset", "not json");
        let output = run_session(&contract, "2\nCAR1\n9\n");

        assert!(output.contains("failed to evaluate transaction: malformed response"));
        assert!(!output.contains(RESULT_PREFIX));
    }

    #[test]
    fn bad_price_skips_ledger_call() {
        let contract = RecordingContract::default();
        let output = run_session(&contract, "6\nCAR1\nscratch\ncheap\n8\nCAR1\n9\n");

        assert!(output.contains("invalid input: repair price \"cheap\" is not a number"));
        assert_eq!(
            contract.calls(),
            vec![call(TransactionKind::Submit, "RepairCar", &["CAR1"])]
        );
    }

    #[test]
    fn end_of_input_stops_the_loop() {
        let contract = RecordingContract::default();
        let output = run_session(&contract, "7\nCAR1\n");

        assert!(contract.calls().is_empty());
        assert!(output.ends_with("New car color: "));
    }

    struct ClosedInput;

    impl Read for ClosedInput {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
        }
    }

    impl BufRead for ClosedInput {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
        }

        fn consume(&mut self, _: usize) {}
    }

    #[test]
    fn console_failure_while_prompting_ends_the_session() {
        let contract = RecordingContract::default();
        let input = Cursor::new(&b"8\n"[..]).chain(ClosedInput);
        let mut dispatcher = Dispatcher::new(&contract, input, Vec::new());

        let err = tokio_test::block_on(dispatcher.run()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Console);
        assert!(contract.calls().is_empty());
        let output = String::from_utf8(dispatcher.output).unwrap();
        assert!(output.ends_with("Car ID: "));
    }

    #[test]
    fn perform_formats_evaluate_results() {
        let contract = RecordingContract::with_result("GetCarsByColor", r#"[{"ID":"CAR1"}]"#);
        let outcome = tokio_test::block_on(perform(
            &contract,
            &Command::GetCarsByColor {
                color: "blue".into(),
            },
        ))
        .unwrap();
        assert_eq!(outcome, Outcome::Result("[\n{\n\"ID\": \"CAR1\"\n}\n]".to_string()));
    }
}
