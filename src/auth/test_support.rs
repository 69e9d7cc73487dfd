// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixtures shared by the auth and api tests: RSA keys, token minting and a
//! scripted key source.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;

use super::error::AuthError;
use super::jwks::{KeyRecord, KeySet, KeySource};

pub const PRIMARY_KID: &str = "primary";
pub const ROTATED_KID: &str = "rotated";

pub const AUDIENCE: &str = "agent-builder";
pub const ISSUER: &str = "https://idp.example.com";

pub const PRIMARY_PEM: &str = include_str!("testdata/primary_key.pem");
pub const FOREIGN_PEM: &str = include_str!("testdata/foreign_key.pem");

const PRIMARY_N: &str = "-aUXftpovfDNJpxv-Hbd5j7bpecyESSJ5L1CMldUKXf2B8XeUGXQHGaYXvDJdALzbblW2_bE5-RqLk1qzgkAP8_9lkzT63GGc0DsqcWtU4IEQPr3tCOqfWzuOC9WFiQ8HUC_sEFmAqX9Dn_S1a6nYSFpeqWrLReSSWsJm1TXNHrffJX5PQmFvZr1SwZsw9EpscGL17NzUurBxKt2AMB0806do6yOs1fAdwdxyIKQ0p5CLMp68qUrjHNHwojPNbFms7xZUKf2R3hE4QOmpRY9DyDWtJb57cN4iHrSW1X3TFEiM444YCaS7yXL6SkicAVjxqo5pg7aOWwrAW-s5G2IMw";
const FOREIGN_N: &str = "wlQwtflDlC-qcSqrKNi-qQ9N3HR0PdhaEgzgdFsukVGvlyGloxuBfy6U_UKW3OdvykILbGT4hXCkn_6VB8UOWshvlUN0eFf2C97InEvmUL1Yf9j0adCdX4vNTr2cJAmLJmoIVaB3kM8R6sk9uI7Zq2MJkZoJ-xz9gQDfH44xhNm-kwPl_1Dod0txbIJ43BoKZr5LF1yzUBg2-38KlHw1cU4DOM9AQW3jB2j7QWOhiV5zvHydBFXlIjr-0cpycUYmW2lhbH6VygPh3RVdfCDKusn80X08uyqD7KKzanJ3A7HMovpDxSI7erX5TaUaEplm1FECvruNmiG-e8QguV59nw";
const EXPONENT: &str = "AQAB";

fn rsa_record(kid: &str, n: &str) -> KeyRecord {
    KeyRecord {
        kid: kid.to_string(),
        kty: Some("RSA".into()),
        alg: Some("RS256".into()),
        usage: Some("sig".into()),
        n: Some(n.to_string()),
        e: Some(EXPONENT.to_string()),
    }
}

/// Public half of `PRIMARY_PEM`.
pub fn primary_record() -> KeyRecord {
    rsa_record(PRIMARY_KID, PRIMARY_N)
}

/// Public half of `FOREIGN_PEM`, published under a second kid.
pub fn rotated_record() -> KeyRecord {
    rsa_record(ROTATED_KID, FOREIGN_N)
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims that pass every check the test gates are configured with.
pub fn valid_claims(sub: &str) -> Value {
    serde_json::json!({
        "sub": sub,
        "aud": AUDIENCE,
        "iss": ISSUER,
        "iat": now(),
        "exp": now() + 3600,
        "tenant": "acme",
    })
}

/// Sign `claims` with RS256 using `pem`, stamping `kid` into the header.
pub fn mint(kid: &str, pem: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key parses");
    encode(&header, claims, &key).expect("token encodes")
}

/// Key source returning a fixed script of key sets. The last entry repeats
/// once the script is exhausted.
pub struct ScriptedKeys {
    script: Mutex<Vec<Vec<KeyRecord>>>,
    fetches: AtomicUsize,
    failing: AtomicBool,
}

impl ScriptedKeys {
    pub fn new(script: Vec<Vec<KeyRecord>>) -> Self {
        Self {
            script: Mutex::new(script),
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let source = Self::new(Vec::new());
        source.fail_from_now_on();
        source
    }

    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl KeySource for ScriptedKeys {
    async fn fetch(&self) -> Result<KeySet, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::KeySetFetch("scripted outage".into()));
        }

        let mut script = self.script.lock().unwrap();
        let records = if script.len() > 1 {
            script.remove(0)
        } else {
            script.first().cloned().unwrap_or_default()
        };
        Ok(records.into_iter().collect())
    }
}
