/// How a ledger call reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Endorsed, ordered and committed.
    Submit,
    /// Read-only query, never ordered.
    Evaluate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    InitLedger,
    ReadPersonAsset,
    ReadCarAsset,
    GetCarsByColor,
    GetCarsByColorAndOwner,
    TransferCarAsset,
    AddCarFault,
    ChangeCarColor,
    RepairCar,
    Exit,
}

impl Selection {
    pub const ALL: [Selection; 10] = [
        Selection::InitLedger,
        Selection::ReadPersonAsset,
        Selection::ReadCarAsset,
        Selection::GetCarsByColor,
        Selection::GetCarsByColorAndOwner,
        Selection::TransferCarAsset,
        Selection::AddCarFault,
        Selection::ChangeCarColor,
        Selection::RepairCar,
        Selection::Exit,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn code(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Selection::InitLedger => "Initialize ledger",
            Selection::ReadPersonAsset => "Read person asset",
            Selection::ReadCarAsset => "Read car asset",
            Selection::GetCarsByColor => "Get cars by color",
            Selection::GetCarsByColorAndOwner => "Get cars by color and owner",
            Selection::TransferCarAsset => "Transfer car to another owner",
            Selection::AddCarFault => "Add car fault",
            Selection::ChangeCarColor => "Change car color",
            Selection::RepairCar => "Repair car",
            Selection::Exit => "Exit",
        }
    }
}

/// A fully prompted ledger operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InitLedger,
    ReadPersonAsset {
        person_id: String,
    },
    ReadCarAsset {
        car_id: String,
    },
    GetCarsByColor {
        color: String,
    },
    GetCarsByColorAndOwner {
        color: String,
        owner_id: String,
    },
    TransferCarAsset {
        car_id: String,
        new_owner_id: String,
        accept_fault: bool,
    },
    AddCarFault {
        car_id: String,
        description: String,
        repair_price: f32,
    },
    ChangeCarColor {
        car_id: String,
        new_color: String,
    },
    RepairCar {
        car_id: String,
    },
}

impl Command {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Command::ReadPersonAsset { .. }
            | Command::ReadCarAsset { .. }
            | Command::GetCarsByColor { .. }
            | Command::GetCarsByColorAndOwner { .. } => TransactionKind::Evaluate,
            Command::InitLedger
            | Command::TransferCarAsset { .. }
            | Command::AddCarFault { .. }
            | Command::ChangeCarColor { .. }
            | Command::RepairCar { .. } => TransactionKind::Submit,
        }
    }

    /// Chaincode function name; must match the deployed contract exactly.
    pub fn transaction_name(&self) -> &'static str {
        match self {
            Command::InitLedger => "InitLedger",
            Command::ReadPersonAsset { .. } => "ReadPersonAsset",
            Command::ReadCarAsset { .. } => "ReadCarAsset",
            Command::GetCarsByColor { .. } => "GetCarsByColor",
            Command::GetCarsByColorAndOwner { .. } => "GetCarsByColorAndOwner",
            Command::TransferCarAsset { .. } => "TransferCarAsset",
            Command::AddCarFault { .. } => "AddCarfault",
            Command::ChangeCarColor { .. } => "ChangeCarColor",
            Command::RepairCar { .. } => "RepairCar",
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Command::InitLedger => vec![],
            Command::ReadPersonAsset { person_id } => vec![person_id.clone()],
            Command::ReadCarAsset { car_id } | Command::RepairCar { car_id } => {
                vec![car_id.clone()]
            }
            Command::GetCarsByColor { color } => vec![color.clone()],
            Command::GetCarsByColorAndOwner { color, owner_id } => {
                vec![color.clone(), owner_id.clone()]
            }
            Command::TransferCarAsset {
                car_id,
                new_owner_id,
                accept_fault,
            } => vec![car_id.clone(), new_owner_id.clone(), accept_fault.to_string()],
            Command::AddCarFault {
                car_id,
                description,
                repair_price,
            } => vec![
                car_id.clone(),
                description.clone(),
                format_price(*repair_price),
            ],
            Command::ChangeCarColor { car_id, new_color } => {
                vec![car_id.clone(), new_color.clone()]
            }
        }
    }
}

/// Only a literal `n` declines a faulted car.
pub fn accept_fault_flag(answer: &str) -> bool {
    answer != "n"
}

/// Six fractional digits, e.g. `120.5` -> `120.500000`.
pub fn format_price(price: f32) -> String {
    format!("{price:.6}")
}
