//! SQL query constants
//!
//! Contains all SQL used by the application.

/// Drop the proposals table (schema reset only)
pub const DROP_BONUS_PROPOSALS: &str = "DROP TABLE IF EXISTS bonus_proposals";

/// Proposals table with the employee id and minimum bonus checks
pub const CREATE_BONUS_PROPOSALS: &str = r#"
    CREATE TABLE IF NOT EXISTS bonus_proposals (
        id SERIAL PRIMARY KEY,
        employee_name VARCHAR(100) NOT NULL,
        employee_id VARCHAR(7) NOT NULL
            CONSTRAINT chk_employee_id_format
            CHECK (employee_id ~ '^ATS0[0-9]{3}$' AND employee_id <> 'ATS0000'),
        proposal_date DATE NOT NULL,
        bonus_amount INTEGER NOT NULL
            CONSTRAINT chk_bonus_amount_min CHECK (bonus_amount >= 100),
        reason TEXT NOT NULL
    )
"#;

/// One proposal per employee per calendar month
pub const CREATE_MONTHLY_UNIQUE_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS uniq_employee_month
    ON bonus_proposals (
        employee_id,
        (EXTRACT(YEAR FROM proposal_date)),
        (EXTRACT(MONTH FROM proposal_date))
    )
"#;

pub const CREATE_EMPLOYEE_DATE_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_bonus_proposals_employee_date
    ON bonus_proposals (employee_id, proposal_date DESC)
"#;

pub const PING: &str = "SELECT 1";

pub const LIST_PROPOSALS: &str = r#"
    SELECT id, employee_name, employee_id, proposal_date, bonus_amount, reason
    FROM bonus_proposals
    ORDER BY proposal_date DESC, id DESC
"#;

pub const FIND_BY_EMPLOYEE: &str = r#"
    SELECT id, employee_name, employee_id, proposal_date, bonus_amount, reason
    FROM bonus_proposals
    WHERE employee_id = $1
    ORDER BY proposal_date DESC, id DESC
"#;

/// Mirrors the unique index expression so the pre-check and the
/// constraint agree on what "same month" means
pub const FIND_IN_MONTH: &str = r#"
    SELECT id, employee_name, employee_id, proposal_date, bonus_amount, reason
    FROM bonus_proposals
    WHERE employee_id = $1
      AND EXTRACT(YEAR FROM proposal_date) = EXTRACT(YEAR FROM $2::date)
      AND EXTRACT(MONTH FROM proposal_date) = EXTRACT(MONTH FROM $2::date)
    LIMIT 1
"#;

pub const FIND_LATEST_FOR_EMPLOYEE: &str = r#"
    SELECT id, employee_name, employee_id, proposal_date, bonus_amount, reason
    FROM bonus_proposals
    WHERE employee_id = $1
    ORDER BY proposal_date DESC, id DESC
    LIMIT 1
"#;

pub const INSERT_PROPOSAL: &str = r#"
    INSERT INTO bonus_proposals (employee_name, employee_id, proposal_date, bonus_amount, reason)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, employee_name, employee_id, proposal_date, bonus_amount, reason
"#;
