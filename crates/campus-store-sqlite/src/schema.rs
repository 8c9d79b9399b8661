//! SQL schema for the campus SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS rooms (
    number      INTEGER PRIMARY KEY CHECK (number > 0),
    capacity    INTEGER NOT NULL CHECK (capacity > 0),
    purpose     TEXT NOT NULL,      -- 'regular' | 'guest' | 'sick_bay' | 'staff' | 'storage'
    created_at  TEXT NOT NULL
);

-- One row per occupied bed. The primary key on student_id is what keeps a
-- student in at most one room.
CREATE TABLE IF NOT EXISTS room_occupants (
    student_id   TEXT PRIMARY KEY,
    room_number  INTEGER NOT NULL REFERENCES rooms(number),
    assigned_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    book_id           TEXT PRIMARY KEY,
    title             TEXT NOT NULL,
    author            TEXT NOT NULL,
    price             TEXT NOT NULL,   -- decimal string
    total_copies      INTEGER NOT NULL CHECK (total_copies >= 0),
    available_copies  INTEGER NOT NULL CHECK (available_copies >= 0),
    added_at          TEXT NOT NULL,
    CHECK (available_copies <= total_copies)
);

-- Loans outlive catalog entries, so book_id is not a foreign key.
-- 'overdue' is never stored; it is derived from 'issued' at read time.
CREATE TABLE IF NOT EXISTS loans (
    loan_id             TEXT PRIMARY KEY,
    book_id             TEXT NOT NULL,
    student_id          TEXT NOT NULL,
    issue_date          TEXT NOT NULL,   -- YYYY-MM-DD
    due_date            TEXT NOT NULL,   -- YYYY-MM-DD
    actual_return_date  TEXT,
    status              TEXT NOT NULL,   -- 'issued' | 'returned' | 'lost' | 'recovered'
    fine                TEXT NOT NULL DEFAULT '0',
    lost_at             TEXT,
    recovered_at        TEXT,
    reminder_sent_at    TEXT
);

-- Append-only: rows are updated by triage but never deleted.
CREATE TABLE IF NOT EXISTS feedback (
    feedback_id   TEXT PRIMARY KEY,
    student_id    TEXT,
    category      TEXT NOT NULL,
    rating        INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment       TEXT NOT NULL,
    anonymous     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    response      TEXT,
    priority      TEXT NOT NULL DEFAULT 'medium',
    is_resolved   INTEGER NOT NULL DEFAULT 0,
    responded_at  TEXT,
    resolved_at   TEXT
);

CREATE INDEX IF NOT EXISTS room_occupants_room_idx ON room_occupants(room_number);
CREATE INDEX IF NOT EXISTS loans_student_idx       ON loans(student_id, status);
CREATE INDEX IF NOT EXISTS loans_book_idx          ON loans(book_id, status);
CREATE INDEX IF NOT EXISTS loans_due_idx           ON loans(status, due_date);
CREATE INDEX IF NOT EXISTS feedback_created_idx    ON feedback(created_at);

PRAGMA user_version = 1;
";
