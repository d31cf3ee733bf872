//! Request body validation.
//!
//! Rules are checked all at once and every failure message is reported,
//! joined with `", "`, in a single `InvalidInput` error.

use crate::types::{
    AppError, ChangePasswordRequest, CreateCourtRequest, CreateUserRequest, ForgotPasswordRequest,
    LoginRequest, Permission, RefreshTokenRequest, ResetPasswordRequest, Result,
    UpdateProfileRequest, UpdateUserRequest,
};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 3;

/// Collects rule violations for one request body.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, message: &str) -> &mut Self {
        self.errors.push(message.to_string());
        self
    }

    /// Non-blank value, else `missing`.
    pub fn required(&mut self, value: &str, missing: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(missing);
        }
        self
    }

    /// Required email that must also look like an address.
    pub fn email(&mut self, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail("Email é obrigatório")
        } else if !is_email(value) {
            self.fail("Email inválido")
        } else {
            self
        }
    }

    /// Required password of at least [`MIN_PASSWORD_LEN`] characters.
    pub fn password(&mut self, value: &str, missing: &str, too_short: &str) -> &mut Self {
        if value.is_empty() {
            self.fail(missing)
        } else if value.chars().count() < MIN_PASSWORD_LEN {
            self.fail(too_short)
        } else {
            self
        }
    }

    pub fn name(&mut self, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail("Nome é obrigatório")
        } else if value.trim().chars().count() < MIN_NAME_LEN {
            self.fail("O nome deve ter pelo menos 3 caracteres")
        } else {
            self
        }
    }

    pub fn confirmation(&mut self, password: &str, confirmation: &str) -> &mut Self {
        if confirmation.is_empty() {
            self.fail("Confirmação de senha é obrigatória")
        } else if password != confirmation {
            self.fail("As senhas não coincidem")
        } else {
            self
        }
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidInput(self.errors.join(", ")))
        }
    }
}

/// Loose address check: one `@`, a non-empty local part and a dotted domain.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

pub fn login(req: &LoginRequest) -> Result<()> {
    Validator::new()
        .email(&req.email)
        .required(&req.senha, "Senha é obrigatória")
        .finish()
}

pub fn refresh_token(req: &RefreshTokenRequest) -> Result<()> {
    Validator::new()
        .required(&req.refresh_token, "Refresh token é obrigatório")
        .finish()
}

pub fn forgot_password(req: &ForgotPasswordRequest) -> Result<()> {
    Validator::new().email(&req.email).finish()
}

pub fn reset_password(req: &ResetPasswordRequest) -> Result<()> {
    Validator::new()
        .required(&req.token, "Token é obrigatório")
        .password(
            &req.senha,
            "Senha é obrigatória",
            "A senha deve ter pelo menos 6 caracteres",
        )
        .confirmation(&req.senha, &req.confirmar_senha)
        .finish()
}

pub fn change_password(req: &ChangePasswordRequest) -> Result<()> {
    Validator::new()
        .required(&req.senha_atual, "Senha atual é obrigatória")
        .password(
            &req.nova_senha,
            "Nova senha é obrigatória",
            "A nova senha deve ter pelo menos 6 caracteres",
        )
        .confirmation(&req.nova_senha, &req.confirmar_senha)
        .finish()
}

pub fn update_profile(req: &UpdateProfileRequest) -> Result<()> {
    Validator::new().name(&req.nome).email(&req.email).finish()
}

pub fn create_user(req: &CreateUserRequest) -> Result<()> {
    let mut v = Validator::new();
    v.name(&req.nome).email(&req.email).password(
        &req.senha,
        "Senha é obrigatória",
        "A senha deve ter pelo menos 6 caracteres",
    );
    match req.permissao {
        Permission::Operator if req.tribunal_id.is_none() => {
            v.fail("Tribunal é obrigatório para operadores");
        }
        Permission::RegionalAdmin if req.regiao_id.is_none() => {
            v.fail("Região é obrigatória para administradores regionais");
        }
        _ => {}
    }
    v.finish()
}

pub fn update_user(req: &UpdateUserRequest) -> Result<()> {
    let mut v = Validator::new();
    if let Some(nome) = &req.nome {
        v.name(nome);
    }
    if let Some(email) = &req.email {
        v.email(email);
    }
    let empty = req.nome.is_none()
        && req.email.is_none()
        && req.cargo.is_none()
        && req.permissao.is_none()
        && req.tribunal_id.is_none()
        && req.regiao_id.is_none()
        && req.status.is_none();
    if empty {
        v.fail("Informe ao menos um campo para atualizar");
    }
    v.finish()
}

pub fn create_court(req: &CreateCourtRequest) -> Result<()> {
    Validator::new()
        .required(&req.nome, "Nome é obrigatório")
        .required(&req.sigla, "Sigla é obrigatória")
        .finish()
}
