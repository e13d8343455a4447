//! Ready-made addresses, UTxOs and transactions.

use mesh_common::cbor::TAG_SET;
use mesh_common::hash::{Hash28, Hash32};
use mesh_common::{
    to_tx_unspent_output, Address, Asset, TransactionInput, TransactionOutput, UTxO, UtxoInput,
    UtxoOutput, VKeyWitness, Value, WitnessSet,
};
use mesh_error::CodecError;
use minicbor::data::Tag;
use minicbor::Encoder;

/// Password used by fixtures that encrypt key material
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Enterprise address whose payment key hash is `[seed; 28]`
pub fn enterprise_address(seed: u8, network_id: u8) -> Address {
    Address::enterprise(&[seed; 28], network_id)
}

/// Bech32 form of [`enterprise_address`]
pub fn enterprise_bech32(seed: u8, network_id: u8) -> String {
    enterprise_address(seed, network_id)
        .to_bech32()
        .expect("enterprise addresses always have a bech32 form")
}

/// Pure-lovelace UTxO at `address`, produced by transaction `[tx_seed; 32]`
pub fn utxo(tx_seed: u8, output_index: u32, address: &str, lovelace: u64) -> UTxO {
    UTxO {
        input: UtxoInput {
            output_index,
            tx_hash: hex::encode([tx_seed; 32]),
        },
        output: UtxoOutput {
            address: address.to_string(),
            amount: vec![Asset::lovelace(lovelace)],
            data_hash: None,
            plutus_data: None,
            script_ref: None,
        },
    }
}

/// CIP-30 wire form of a UTxO
pub fn utxo_cbor_hex(utxo: &UTxO) -> String {
    to_tx_unspent_output(utxo)
        .and_then(|native| native.to_hex())
        .expect("fixture UTxOs are well formed")
}

/// Builder for transactions in their wire form.
#[derive(Debug, Clone)]
pub struct TxFixture {
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
    fee: u64,
    collateral: Vec<TransactionInput>,
    withdrawals: Vec<(Address, u64)>,
    required_signers: Vec<Hash28>,
    signatures: Option<Vec<VKeyWitness>>,
}

impl Default for TxFixture {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            fee: 170_000,
            collateral: Vec::new(),
            withdrawals: Vec::new(),
            required_signers: Vec::new(),
            signatures: None,
        }
    }
}

impl TxFixture {
    /// Empty transaction paying the default fee
    pub fn new() -> Self {
        Self::default()
    }

    /// Spends `[transaction_id, index]`
    pub fn input(mut self, transaction_id: Hash32, index: u64) -> Self {
        self.inputs.push(TransactionInput { transaction_id, index });
        self
    }

    /// Spends the output referenced by `utxo`
    pub fn spending(self, utxo: &UTxO) -> Self {
        let id = reference(utxo);
        self.input(id, utxo.input.output_index as u64)
    }

    /// Uses `utxo` as collateral
    pub fn collateral(mut self, utxo: &UTxO) -> Self {
        self.collateral.push(TransactionInput {
            transaction_id: reference(utxo),
            index: utxo.input.output_index as u64,
        });
        self
    }

    /// Pays `lovelace` to `address`
    pub fn output(mut self, address: Address, lovelace: u64) -> Self {
        self.outputs.push(TransactionOutput::new(address, Value::coin(lovelace)));
        self
    }

    /// Sets the fee
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Withdraws `lovelace` from `reward_address`
    pub fn withdrawal(mut self, reward_address: Address, lovelace: u64) -> Self {
        self.withdrawals.push((reward_address, lovelace));
        self
    }

    /// Requires a signature from `key_hash`
    pub fn required_signer(mut self, key_hash: Hash28) -> Self {
        self.required_signers.push(key_hash);
        self
    }

    /// Carries `witness` in the witness set
    pub fn signed_by(mut self, witness: VKeyWitness) -> Self {
        self.signatures.get_or_insert_with(Vec::new).push(witness);
        self
    }

    /// Body bytes
    pub fn body_cbor(&self) -> Vec<u8> {
        let mut e = Encoder::new(Vec::new());
        self.encode_body(&mut e).expect("fixture bodies are well formed");
        e.into_writer()
    }

    /// Whole transaction bytes
    pub fn to_cbor(&self) -> Vec<u8> {
        let witness_set = match &self.signatures {
            Some(signatures) => WitnessSet::from_signatures(signatures.clone()),
            None => WitnessSet::default(),
        };

        let mut e = Encoder::new(Vec::new());
        e.array(4).expect("encoding into a Vec cannot fail");
        e.writer_mut().extend_from_slice(&self.body_cbor());
        witness_set.encode(&mut e).expect("fixture witness sets are well formed");
        e.bool(true).and_then(|e| e.null()).expect("encoding into a Vec cannot fail");
        e.into_writer()
    }

    /// Whole transaction hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_cbor())
    }

    fn encode_body(&self, e: &mut Encoder<Vec<u8>>) -> Result<(), CodecError> {
        let entries = 3
            + !self.withdrawals.is_empty() as u64
            + !self.collateral.is_empty() as u64
            + !self.required_signers.is_empty() as u64;
        e.map(entries)?;

        e.u8(0)?;
        encode_inputs(e, &self.inputs)?;

        e.u8(1)?.array(self.outputs.len() as u64)?;
        for output in &self.outputs {
            output.encode(e)?;
        }

        e.u8(2)?.u64(self.fee)?;

        if !self.withdrawals.is_empty() {
            e.u8(5)?.map(self.withdrawals.len() as u64)?;
            for (address, lovelace) in &self.withdrawals {
                e.bytes(address.as_bytes())?.u64(*lovelace)?;
            }
        }
        if !self.collateral.is_empty() {
            e.u8(13)?;
            encode_inputs(e, &self.collateral)?;
        }
        if !self.required_signers.is_empty() {
            e.u8(14)?.array(self.required_signers.len() as u64)?;
            for signer in &self.required_signers {
                e.bytes(signer)?;
            }
        }
        Ok(())
    }
}

fn encode_inputs(e: &mut Encoder<Vec<u8>>, inputs: &[TransactionInput]) -> Result<(), CodecError> {
    e.tag(Tag::new(TAG_SET))?.array(inputs.len() as u64)?;
    for input in inputs {
        input.encode(e)?;
    }
    Ok(())
}

fn reference(utxo: &UTxO) -> Hash32 {
    hex::decode(&utxo.input.tx_hash)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .expect("fixture UTxOs reference 32-byte transaction ids")
}
