//! Compiled contract artifacts.
//!
//! Accepts Truffle output (`bytecode` is a hex string) and Foundry output
//! (`bytecode.object`). Constructor and call data are encoded against the
//! ABI's declared parameter types, so callers pass plain string values.

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::{Event, Function, JsonAbi, Param};
use alloy::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(Bytes),
    Object { object: Bytes },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: Option<BytecodeField>,
}

/// A compiled contract: name, ABI and creation bytecode.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl Artifact {
    /// Read and parse an artifact JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        let fallback_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_json(&raw, &fallback_name)
            .with_context(|| format!("invalid artifact {}", path.display()))
    }

    /// Parse artifact JSON. `fallback_name` is used when the file carries no
    /// `contractName`.
    pub fn from_json(raw: &str, fallback_name: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(raw).context("failed to parse artifact")?;
        let bytecode = match file.bytecode {
            Some(BytecodeField::Hex(b)) | Some(BytecodeField::Object { object: b }) => b,
            None => Bytes::new(),
        };
        Ok(Self {
            contract_name: file.contract_name.unwrap_or_else(|| fallback_name.to_string()),
            abi: file.abi,
            bytecode,
        })
    }

    /// Creation code followed by the ABI-encoded constructor arguments.
    pub fn deploy_code(&self, args: &[String]) -> Result<Bytes> {
        anyhow::ensure!(
            !self.bytecode.is_empty(),
            "{} has no creation bytecode (abstract contract or interface?)",
            self.contract_name
        );

        let encoded_args = match self.abi.constructor() {
            Some(ctor) => {
                let values = coerce_params(&ctor.inputs, args)
                    .with_context(|| format!("{} constructor", self.contract_name))?;
                ctor.abi_encode_input(&values)
                    .with_context(|| format!("failed to encode {} constructor", self.contract_name))?
            }
            None => {
                anyhow::ensure!(
                    args.is_empty(),
                    "{} has no constructor but {} arguments were given",
                    self.contract_name,
                    args.len()
                );
                Vec::new()
            }
        };

        let mut code = Vec::with_capacity(self.bytecode.len() + encoded_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(&encoded_args);
        Ok(code.into())
    }

    /// The first overload of function `name`.
    pub fn function(&self, name: &str) -> Result<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .with_context(|| format!("{} ABI has no function `{name}`", self.contract_name))
    }

    /// The first overload of event `name`.
    pub fn event(&self, name: &str) -> Result<&Event> {
        self.abi
            .event(name)
            .and_then(|overloads| overloads.first())
            .with_context(|| format!("{} ABI has no event `{name}`", self.contract_name))
    }

    /// Selector-prefixed call data for `name(args...)`.
    pub fn encode_call(&self, name: &str, args: &[String]) -> Result<Bytes> {
        let function = self.function(name)?;
        let values = coerce_params(&function.inputs, args)
            .with_context(|| format!("{}.{name}", self.contract_name))?;
        let data = function
            .abi_encode_input(&values)
            .with_context(|| format!("failed to encode {}.{name}", self.contract_name))?;
        Ok(data.into())
    }
}

/// Coerce each string argument into the Solidity type declared by `params`.
fn coerce_params(params: &[Param], args: &[String]) -> Result<Vec<DynSolValue>> {
    anyhow::ensure!(
        params.len() == args.len(),
        "expected {} arguments, got {}",
        params.len(),
        args.len()
    );
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .with_context(|| format!("unsupported parameter type {}", param.ty))?;
            ty.coerce_str(arg)
                .with_context(|| format!("`{arg}` is not a valid {} for `{}`", param.ty, param.name))
        })
        .collect()
}
